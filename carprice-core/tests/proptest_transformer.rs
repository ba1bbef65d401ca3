//! Property-based tests for the feature transformer using proptest.

use proptest::prelude::*;

use carprice_core::features::{FeatureTransformer, OTHER, TransformerConfig};
use carprice_core::{CategoricalColumn, RawRecord};

const BRANDS: &[&str] = &["Hyundai", "Maruti", "Honda", "Tata", "Lamborghini", "Skoda"];
const MODELS: &[&str] = &["Creta", "Swift", "City", "Nexon", "Huracan", "Octavia", "i20"];
const FUELS: &[&str] = &["PETROL", "DIESEL", "CNG", "ELECTRIC"];
const LOCATIONS: &[&str] = &["KA-05", "DL-3C", "MH-01", "HR-98"];
const DRIVES: &[&str] = &["Manual", "Automatic"];
const TYPES: &[&str] = &["SUV", "HatchBack", "Sedan", "Lux_SUV"];

fn record_strategy() -> impl Strategy<Value = RawRecord> {
    (
        2000i64..2025,
        0i64..300_000,
        1i64..5,
        prop::sample::select(FUELS),
        prop::sample::select(LOCATIONS),
        prop::sample::select(DRIVES),
        prop::sample::select(TYPES),
        prop::sample::select(BRANDS),
        prop::sample::select(MODELS),
    )
        .prop_map(
            |(year, distance, owner, fuel, location, drive, body_type, brand, model)| RawRecord {
                year,
                distance,
                owner,
                fuel: fuel.to_string(),
                location: location.to_string(),
                drive: drive.to_string(),
                body_type: body_type.to_string(),
                brand: brand.to_string(),
                model: model.to_string(),
                price: None,
            },
        )
}

fn fitted(training: &[RawRecord]) -> FeatureTransformer {
    let mut transformer = FeatureTransformer::new(TransformerConfig::default());
    transformer.fit(training).unwrap();
    transformer
}

proptest! {
    #[test]
    fn transform_is_deterministic(
        training in prop::collection::vec(record_strategy(), 1..40),
        batch in prop::collection::vec(record_strategy(), 0..20),
    ) {
        let transformer = fitted(&training);
        let first = transformer.transform(&batch).unwrap();
        let second = transformer.transform(&batch).unwrap();
        let first_bits: Vec<u64> = first.as_slice().iter().map(|v| v.to_bits()).collect();
        let second_bits: Vec<u64> = second.as_slice().iter().map(|v| v.to_bits()).collect();
        prop_assert_eq!(first_bits, second_bits);
    }

    #[test]
    fn width_is_invariant_across_batches(
        training in prop::collection::vec(record_strategy(), 1..40),
        b1 in prop::collection::vec(record_strategy(), 0..20),
        b2 in prop::collection::vec(record_strategy(), 0..20),
    ) {
        let transformer = fitted(&training);
        let w = transformer.width().unwrap();
        prop_assert_eq!(transformer.transform(&b1).unwrap().width(), w);
        prop_assert_eq!(transformer.transform(&b2).unwrap().width(), w);
        prop_assert_eq!(transformer.feature_names().unwrap().len(), w);
    }

    #[test]
    fn every_categorical_block_sets_at_most_one_slot(
        training in prop::collection::vec(record_strategy(), 1..40),
        batch in prop::collection::vec(record_strategy(), 1..20),
    ) {
        let transformer = fitted(&training);
        let matrix = transformer.transform(&batch).unwrap();
        for row in matrix.rows() {
            let mut offset = 3;
            for column in CategoricalColumn::ALL {
                let len = transformer.vocabulary(column).unwrap().len();
                let block = &row[offset..offset + len];
                prop_assert!(block.iter().all(|&v| v == 0.0 || v == 1.0));
                prop_assert!(block.iter().filter(|&&v| v == 1.0).count() <= 1);
                offset += len;
            }
            prop_assert_eq!(offset, row.len());
        }
    }

    #[test]
    fn collapsed_model_column_always_has_other(
        training in prop::collection::vec(record_strategy(), 1..40),
    ) {
        let transformer = fitted(&training);
        let vocab = transformer.vocabulary(CategoricalColumn::Model).unwrap();
        prop_assert!(vocab.contains(OTHER));
        let values = vocab.values().to_vec();
        let mut sorted = values.clone();
        sorted.sort();
        prop_assert_eq!(values, sorted);
    }

    #[test]
    fn fit_is_reproducible(
        training in prop::collection::vec(record_strategy(), 1..40),
    ) {
        prop_assert_eq!(fitted(&training), fitted(&training));
    }
}
