//! Cartesian expansion of a specification's indices into variants.

use ktgen_spec::{Extent, IndexSpec};

/// File stem and target suffix used when a specification has no indices.
const SCALAR_STEM: &str = "scalar";

/// One concrete extent for every index of a specification, in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variant {
    assignments: Vec<(char, Extent)>,
}

impl Variant {
    pub fn extent(&self, symbol: char) -> Option<Extent> {
        self.assignments
            .iter()
            .find(|(s, _)| *s == symbol)
            .map(|(_, extent)| *extent)
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, Extent)> + '_ {
        self.assignments.iter().copied()
    }

    pub fn has_dynamic(&self) -> bool {
        self.assignments.iter().any(|(_, e)| e.is_dynamic())
    }

    /// `s`/`d` per index in declared order, e.g. `sds`.
    pub fn tag(&self) -> String {
        self.assignments.iter().map(|(_, e)| e.tag_char()).collect()
    }

    /// Name shared by the generated source file and its build targets.
    pub fn stem(&self) -> String {
        if self.assignments.is_empty() {
            SCALAR_STEM.to_string()
        } else {
            self.tag()
        }
    }

    pub fn source_file_name(&self) -> String {
        format!("{}.cpp", self.stem())
    }
}

/// Every variant of `indices`, lexicographic in declared order with the last
/// index varying fastest and static before dynamic.
pub fn enumerate(indices: &[IndexSpec]) -> Vec<Variant> {
    let choices: Vec<Vec<Extent>> = indices.iter().map(IndexSpec::extents_to_test).collect();
    let total: usize = choices.iter().map(Vec::len).product();
    let mut variants = Vec::with_capacity(total);
    let mut counters = vec![0usize; choices.len()];

    loop {
        variants.push(Variant {
            assignments: indices
                .iter()
                .zip(&choices)
                .zip(&counters)
                .map(|((index, extents), &at)| (index.symbol, extents[at]))
                .collect(),
        });

        let mut position = counters.len();
        loop {
            if position == 0 {
                return variants;
            }
            position -= 1;
            counters[position] += 1;
            if counters[position] < choices[position].len() {
                break;
            }
            counters[position] = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn indices() -> Vec<IndexSpec> {
        vec![
            IndexSpec::new('i', 4),
            IndexSpec::new('j', 3).static_only(),
            IndexSpec::new('k', 5),
        ]
    }

    #[test]
    fn count_is_product_of_choices() {
        let variants = enumerate(&indices());
        assert_eq!(variants.len(), 4);
        let tags: HashSet<String> = variants.iter().map(Variant::tag).collect();
        assert_eq!(tags.len(), 4);
    }

    #[test]
    fn order_is_lexicographic_in_declared_order() {
        let tags: Vec<String> = enumerate(&indices()).iter().map(Variant::tag).collect();
        assert_eq!(tags, vec!["sss", "ssd", "dss", "dsd"]);
    }

    #[test]
    fn tag_positions_track_dynamic_indices() {
        for variant in enumerate(&indices()) {
            for (position, (symbol, extent)) in variant.iter().enumerate() {
                let c = variant.tag().chars().nth(position).unwrap();
                assert_eq!(c == 'd', extent.is_dynamic());
                assert_eq!(variant.extent(symbol), Some(extent));
            }
        }
    }

    #[test]
    fn static_only_index_is_always_static() {
        for variant in enumerate(&indices()) {
            assert_eq!(variant.extent('j'), Some(Extent::Static(3)));
        }
    }

    #[test]
    fn no_indices_yields_one_scalar_variant() {
        let variants = enumerate(&[]);
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].tag(), "");
        assert_eq!(variants[0].source_file_name(), "scalar.cpp");
        assert!(!variants[0].has_dynamic());
    }
}
