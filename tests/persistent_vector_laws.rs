//! Property-based tests for PersistentVector laws.
//!
//! Verifies the algebraic laws of the vector against `Vec` as a model, and
//! that transient batches agree with the same operations done persistently.

use pvector::persistent::{IndexOutOfRange, PersistentVector};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Operation {
    PushBack(i32),
    /// Index is reduced modulo the length at the time it is applied.
    Update(usize, i32),
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop_oneof![
        3 => any::<i32>().prop_map(Operation::PushBack),
        1 => (any::<usize>(), any::<i32>()).prop_map(|(index, value)| Operation::Update(index, value)),
    ]
}

fn apply_persistent(vector: &PersistentVector<i32>, operation: &Operation) -> PersistentVector<i32> {
    match *operation {
        Operation::PushBack(value) => vector.push_back(value),
        Operation::Update(index, value) if !vector.is_empty() => {
            vector.update(index % vector.len(), value).unwrap()
        }
        Operation::Update(..) => vector.clone(),
    }
}

fn apply_model(model: &mut Vec<i32>, operation: &Operation) {
    match *operation {
        Operation::PushBack(value) => model.push(value),
        Operation::Update(index, value) if !model.is_empty() => {
            let length = model.len();
            model[index % length] = value;
        }
        Operation::Update(..) => {}
    }
}

// =============================================================================
// Basic Laws
// =============================================================================

proptest! {
    /// Length Law: push_back increases the length by exactly one
    #[test]
    fn prop_push_back_length_law(
        elements in prop::collection::vec(any::<i32>(), 0..200),
        new_element: i32
    ) {
        let vector: PersistentVector<i32> = elements.iter().copied().collect();
        let with_element = vector.push_back(new_element);

        prop_assert_eq!(with_element.len(), vector.len() + 1);
    }

    /// Append-Read Law: the pushed element is last and earlier ones are unchanged
    #[test]
    fn prop_push_back_read_law(
        elements in prop::collection::vec(any::<i32>(), 0..200),
        new_element: i32
    ) {
        let vector: PersistentVector<i32> = elements.iter().copied().collect();
        let with_element = vector.push_back(new_element);

        prop_assert_eq!(with_element.at(vector.len()), Ok(&new_element));
        for index in 0..vector.len() {
            prop_assert_eq!(with_element.get(index), vector.get(index));
        }
    }

    /// Get-Update Law: the updated element is read back
    #[test]
    fn prop_get_update_law(
        elements in prop::collection::vec(any::<i32>(), 1..200),
        seed: usize,
        new_value: i32
    ) {
        let vector: PersistentVector<i32> = elements.iter().copied().collect();
        let index = seed % vector.len();
        let updated = vector.update(index, new_value).unwrap();

        prop_assert_eq!(updated.get(index), Some(&new_value));
    }

    /// Get-Update-Other Law: update does not affect other indices
    #[test]
    fn prop_get_update_other_law(
        elements in prop::collection::vec(any::<i32>(), 2..200),
        seed: usize,
        new_value: i32
    ) {
        let vector: PersistentVector<i32> = elements.iter().copied().collect();
        let update_index = seed % vector.len();
        let updated = vector.update(update_index, new_value).unwrap();

        for check_index in (0..vector.len()).filter(|index| *index != update_index) {
            prop_assert_eq!(
                updated.get(check_index),
                vector.get(check_index),
                "Update at {} should not affect index {}",
                update_index,
                check_index
            );
        }
    }

    /// Persistence Law: the receiver of an update is unchanged
    #[test]
    fn prop_update_preserves_original(
        elements in prop::collection::vec(any::<i32>(), 1..200),
        seed: usize,
        new_value: i32
    ) {
        let vector: PersistentVector<i32> = elements.iter().copied().collect();
        let index = seed % vector.len();
        let _updated = vector.update(index, new_value).unwrap();

        prop_assert_eq!(vector.get(index), Some(&elements[index]));
        prop_assert!(vector.iter().eq(elements.iter()));
    }

    /// Bounds Law: every index at or past the length is rejected
    #[test]
    fn prop_out_of_range_rejected(
        elements in prop::collection::vec(any::<i32>(), 0..100),
        offset in 0usize..1000
    ) {
        let vector: PersistentVector<i32> = elements.iter().copied().collect();
        let index = vector.len() + offset;
        let expected = IndexOutOfRange { index, length: vector.len() };

        prop_assert_eq!(vector.at(index), Err(expected));
        prop_assert_eq!(vector.update(index, 0).unwrap_err(), expected);
    }
}

// =============================================================================
// Model Laws
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every intermediate version matches the model at the time it was made
    #[test]
    fn prop_versions_match_model(
        operations in prop::collection::vec(operation_strategy(), 0..400)
    ) {
        let mut versions = vec![PersistentVector::new()];
        let mut models = vec![Vec::new()];

        for operation in &operations {
            let next = apply_persistent(versions.last().unwrap(), operation);
            let mut model = models.last().unwrap().clone();
            apply_model(&mut model, operation);
            versions.push(next);
            models.push(model);
        }

        for (version, model) in versions.iter().zip(models.iter()) {
            prop_assert_eq!(version.len(), model.len());
            prop_assert!(version.iter().eq(model.iter()));
        }
    }

    /// Transient Convergence Law: a transient batch equals the persistent one
    #[test]
    fn prop_transient_convergence(
        prefix in prop::collection::vec(any::<i32>(), 0..100),
        operations in prop::collection::vec(operation_strategy(), 0..400)
    ) {
        let start: PersistentVector<i32> = prefix.iter().copied().collect();

        let persistent_result = operations
            .iter()
            .fold(start.clone(), |vector, operation| apply_persistent(&vector, operation));

        let mut transient = start.clone().transient();
        for operation in &operations {
            match *operation {
                Operation::PushBack(value) => transient.push_back(value),
                Operation::Update(index, value) if !transient.is_empty() => {
                    let length = transient.len();
                    transient.update(index % length, value).unwrap();
                }
                Operation::Update(..) => {}
            }
        }
        let transient_result = transient.persistent();

        prop_assert_eq!(&transient_result, &persistent_result);
        prop_assert!(start.iter().eq(prefix.iter()));
    }
}
