#![no_main]

use ferrous_registrar::{
    Constructor, IssueKind, Lifetime, Parameter, RegistrationIntent, Registrar, TypeDescriptor, TypeKey,
    TypeUniverse, ValidationSeverity,
};
use libfuzzer_sys::fuzz_target;

fn component(i: u8) -> TypeKey {
    TypeKey::named(format!("fuzz::Component{}", i))
}

// Byte pairs describe edges of a graph over at most 16 components; the
// first byte picks how many components are registered and their lifetimes.
fuzz_target!(|data: &[u8]| {
    let Some((&header, edges)) = data.split_first() else {
        return;
    };
    let nodes = (header % 16) + 1;

    let mut constructors: Vec<Constructor> = (0..nodes).map(|_| Constructor::new()).collect();
    for pair in edges.chunks_exact(2).take(64) {
        let (from, to) = (pair[0] % nodes, pair[1] % 17);
        let dependency = if to == 16 { TypeKey::named("fuzz::Unregistered") } else { component(to % nodes) };
        let ctor = std::mem::take(&mut constructors[from as usize]);
        constructors[from as usize] = ctor.parameter(Parameter::new(dependency));
    }

    let mut universe = TypeUniverse::new();
    for (i, ctor) in constructors.into_iter().enumerate() {
        universe.insert(TypeDescriptor::implementation_named(component(i as u8)).constructor(ctor));
    }

    let mut registrar = Registrar::new(universe);
    for i in 0..nodes {
        let lifetime = Lifetime::ALL[((header >> 4) as usize + i as usize) % 3];
        registrar.register(RegistrationIntent::new(component(i), lifetime));
    }
    let Ok(composition) = registrar.build() else {
        return;
    };

    let all = composition.validate_with(ValidationSeverity::Warning);
    let errors = composition.validate_with(ValidationSeverity::Error);
    assert!(errors.len() <= all.len());

    for issue in &all {
        if let IssueKind::Cycle { path } = &issue.kind {
            assert!(path.len() >= 2);
            assert_eq!(path.first(), path.last());
        }
    }
});
