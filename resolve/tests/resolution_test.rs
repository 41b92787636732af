//! Address resolution across randomly shaped region chains.

use proptest::prelude::*;
use resolve::{Anchor, Shape, Symbol, SymbolTable, WORD};

// ============================================================================
// Helpers
// ============================================================================

/// A straight chain of `depth + 1` regions, each declaring `count` integers
/// named `v{region}_{k}`.
fn chain(depth: u32, count: u32) -> SymbolTable {
    let mut table = SymbolTable::new();
    for region in 0..=depth {
        let father = region.checked_sub(1);
        let r = table.add_region(region, father, region);
        for k in 0..count {
            r.push(Symbol::variable(
                &format!("v{region}_{k}"),
                (k + 1) * WORD,
                "integer",
            ));
        }
    }
    table
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn hops_and_displacement_follow_the_declaration(
        depth in 0u32..8,
        count in 1u32..6,
        pick in any::<prop::sample::Index>(),
        slot in any::<prop::sample::Index>(),
    ) {
        let table = chain(depth, count);
        let declared = pick.index(depth as usize + 1) as u32;
        let k = slot.index(count as usize) as u32;
        let name = format!("v{declared}_{k}");

        let access = table.resolve_access(depth, &[name.as_str()]).unwrap();
        prop_assert_eq!(access.declared_in, declared);
        prop_assert_eq!(access.hops, depth - declared);
        prop_assert_eq!(access.anchor, Anchor::Local);
        prop_assert_eq!(access.displacement, -(((k + 2) * WORD) as i32));
        prop_assert_eq!(access.shape, Shape::Word);
    }

    #[test]
    fn inner_declaration_shadows_outer(depth in 1u32..8) {
        let mut table = chain(depth, 1);
        table
            .regions
            .get_mut(&depth)
            .unwrap()
            .push(Symbol::variable("v0_0", 8, "integer"));
        let access = table.resolve_access(depth, &["v0_0"]).unwrap();
        prop_assert_eq!(access.declared_in, depth);
        prop_assert_eq!(access.hops, 0);
        prop_assert_eq!(access.displacement, -12);
    }
}

#[test]
fn parameters_resolve_against_the_whole_area() {
    let mut table = SymbolTable::new();
    table.add_region(0, None, 0);
    table
        .add_region(1, Some(0), 1)
        .push(Symbol::parameter("first", 4, "integer"))
        .push(Symbol::parameter("second", 8, "integer"))
        .push(Symbol::parameter("third", 12, "integer"));

    // Pushed in order: the first parameter ends up highest.
    let displacements: Vec<i32> = ["first", "second", "third"]
        .iter()
        .map(|p| table.resolve_access(1, &[p]).unwrap().displacement)
        .collect();
    assert_eq!(displacements, vec![8, 4, 0]);
}
