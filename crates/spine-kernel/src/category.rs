//! Category classifier.
//!
//! Categories are ordered conjunctions of truth-interaction cuts. The
//! compiled classifier returns the index of the first satisfied category
//! and NaN when none is satisfied.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::bind::{Bound, all_of, negate};
use crate::catalog::Catalog;
use crate::construct::split_negation;
use crate::error::SelectionError;
use crate::model::TrueInteraction;

/// A cut reference inside a category; the name may carry a leading `!`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCut {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub cuts: Vec<CategoryCut>,
}

/// Binds every category's cuts against the truth-interaction registry.
/// Unknown names and bad parameter counts fail here, before any spill.
pub fn compile_classifier(
    catalog: &Catalog,
    categories: &[Category],
) -> Result<Bound<TrueInteraction, f64>, SelectionError> {
    let mut buckets = Vec::with_capacity(categories.len());
    for category in categories {
        let mut cuts = Vec::with_capacity(category.cuts.len());
        for cut in &category.cuts {
            let (base, inverted) = split_negation(&cut.name, "category cut")?;
            let bound = catalog
                .cuts()
                .lookup::<TrueInteraction>(base)?
                .bind(base, &cut.parameters)?;
            cuts.push(if inverted { negate(bound) } else { bound });
        }
        buckets.push(all_of(cuts));
    }
    Ok(Arc::new(move |interaction: &TrueInteraction| {
        buckets
            .iter()
            .position(|bucket| bucket(interaction))
            .map_or(f64::NAN, |index| index as f64)
    }))
}

/// Compiles `categories` and publishes the classifier as the truth
/// variable `category`.
pub fn publish_categories(
    catalog: &mut Catalog,
    categories: &[Category],
) -> Result<(), SelectionError> {
    let classifier = compile_classifier(catalog, categories)?;
    catalog.publish_category(classifier)?;
    tracing::debug!(count = categories.len(), "categories published");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::Arity;
    use crate::catalog::{CatalogBuilder, bootstrap_with};
    use crate::error::RegistryError;
    use crate::model::Interaction;
    use crate::scoped;

    fn neutrino<P>(interaction: &Interaction<P>) -> bool {
        interaction.nu_id >= 0
    }

    fn iscc(interaction: &TrueInteraction) -> bool {
        interaction.current_type == 0
    }

    fn min_x<P>(interaction: &Interaction<P>, parameters: &[f64]) -> bool {
        interaction.vertex[0] >= parameters[0]
    }

    fn register(builder: &mut CatalogBuilder) -> Result<(), RegistryError> {
        builder.register_cut("neutrino", scoped!(both, neutrino))?;
        builder.register_cut("iscc", scoped!(true, iscc))?;
        builder.register_cut("min_x", scoped!(both, min_x, Arity::Exactly(1)))
    }

    fn cut(name: &str) -> CategoryCut {
        CategoryCut {
            name: name.to_string(),
            parameters: Vec::new(),
        }
    }

    fn categories() -> Vec<Category> {
        vec![
            Category {
                name: "cc".to_string(),
                cuts: vec![cut("neutrino"), cut("iscc")],
            },
            Category {
                name: "nc".to_string(),
                cuts: vec![cut("neutrino"), cut("!iscc")],
            },
        ]
    }

    fn interaction(nu_id: i64, current_type: i64) -> TrueInteraction {
        TrueInteraction {
            nu_id,
            current_type,
            ..TrueInteraction::default()
        }
    }

    #[test]
    fn first_satisfied_category_wins() {
        let catalog = bootstrap_with(&[register]).expect("bootstrap");
        let classify = compile_classifier(&catalog, &categories()).expect("compile");
        assert_eq!(classify(&interaction(0, 0)), 0.0);
        assert_eq!(classify(&interaction(0, 1)), 1.0);
        assert!(classify(&interaction(-1, 0)).is_nan());
    }

    #[test]
    fn classification_is_stable_across_calls() {
        let catalog = bootstrap_with(&[register]).expect("bootstrap");
        let classify = compile_classifier(&catalog, &categories()).expect("compile");
        let sample = interaction(2, 1);
        let first = classify(&sample);
        for _ in 0..5 {
            assert_eq!(classify(&sample), first);
        }
    }

    #[test]
    fn overlapping_categories_resolve_to_declared_order() {
        let catalog = bootstrap_with(&[register]).expect("bootstrap");
        let overlapping = vec![
            Category {
                name: "any_neutrino".to_string(),
                cuts: vec![cut("neutrino")],
            },
            Category {
                name: "cc".to_string(),
                cuts: vec![cut("neutrino"), cut("iscc")],
            },
        ];
        let classify = compile_classifier(&catalog, &overlapping).expect("compile");
        assert_eq!(classify(&interaction(0, 0)), 0.0);
    }

    #[test]
    fn unknown_cut_fails_at_compile_time() {
        let catalog = bootstrap_with(&[register]).expect("bootstrap");
        let broken = vec![Category {
            name: "broken".to_string(),
            cuts: vec![cut("!no_such_cut")],
        }];
        let err = compile_classifier(&catalog, &broken).err().expect("error");
        assert!(matches!(
            err,
            SelectionError::Registry(RegistryError::NameNotFound { ref name, .. })
                if name == "true_no_such_cut"
        ));
    }

    #[test]
    fn parameter_count_is_checked_at_compile_time() {
        let catalog = bootstrap_with(&[register]).expect("bootstrap");
        let broken = vec![Category {
            name: "broken".to_string(),
            cuts: vec![cut("min_x")],
        }];
        let err = compile_classifier(&catalog, &broken).err().expect("error");
        assert!(matches!(err, SelectionError::Parameter(_)));
    }

    #[test]
    fn published_classifier_is_a_truth_variable() {
        let mut catalog = bootstrap_with(&[register]).expect("bootstrap");
        publish_categories(&mut catalog, &categories()).expect("publish");
        let category = catalog
            .variables()
            .lookup::<TrueInteraction>("category")
            .expect("registered")
            .bind("category", &[])
            .expect("bind");
        assert_eq!(category(&interaction(0, 1)), 1.0);
    }
}
