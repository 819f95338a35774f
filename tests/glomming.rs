use exo_sieve::catalog::glom::{GlomKind, glom_variables};
use proptest::prelude::*;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn mixed_variable_list() {
    let n = names(&[
        "vel_x", "vel_y", "vel_z", "sig_xx", "sig_yy", "sig_zz", "sig_xy", "sig_xz", "sig_yz",
        "eps_QUAD1", "eps_QUAD2", "eps_QUAD3", "eps_QUAD4", "", "temp",
    ]);
    let truth = vec![vec![true; n.len()]];
    let arrays = glom_variables(&n, &truth);
    let summary: Vec<_> = arrays
        .iter()
        .map(|a| (a.name.as_str(), a.components, a.glom))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("vel", 3, GlomKind::Vector3),
            ("sig", 6, GlomKind::SymmetricTensor),
            ("eps", 4, GlomKind::IntegrationPoint),
            ("null_13", 1, GlomKind::Scalar),
            ("temp", 1, GlomKind::Scalar),
        ]
    );
}

#[test]
fn truth_mismatch_breaks_a_vector() {
    let n = names(&["u_x", "u_y", "u_z"]);
    let truth = vec![vec![true, true, false], vec![true, true, true]];
    let arrays = glom_variables(&n, &truth);
    assert_eq!(arrays[0].components, 2);
    assert_eq!(arrays[0].object_truth, vec![true, true]);
    assert_eq!(arrays[1].name, "u_z");
}

proptest! {
    #[test]
    fn prop_glomming_is_deterministic_and_covers_every_variable(
        raw in prop::collection::vec(
            prop::sample::select(vec!["a_x", "a_y", "a_z", "b", "c_xx", "c_yy", "p_TRI1", "p_TRI2", "T"]),
            0..24,
        ),
        objects in 1usize..4,
    ) {
        let n = names(&raw);
        let truth = vec![vec![true; n.len()]; objects];
        let first = glom_variables(&n, &truth);
        let second = glom_variables(&n, &truth);
        prop_assert_eq!(&first, &second);

        let covered: Vec<usize> = first
            .iter()
            .flat_map(|a| a.original_indices.iter().copied())
            .collect();
        prop_assert_eq!(covered, (0..n.len()).collect::<Vec<_>>());

        let mut seen = std::collections::HashSet::new();
        for a in &first {
            prop_assert!(seen.insert(a.name.clone()), "duplicate name {}", a.name);
            prop_assert_eq!(a.components, a.original_names.len());
        }
    }
}
