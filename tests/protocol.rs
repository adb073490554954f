use optout_proof::backend::{CkksBackend, ClearBackend, HeBackend};
use optout_proof::ckks::CkksParameters;
use optout_proof::config::ProtocolConfig;
use optout_proof::dataset::{DataGenerator, EncryptedDataset};
use optout_proof::protocol::PipelineContext;
use optout_proof::OptOutError;
use proptest::prelude::*;

const EPS: f64 = 1e-4;

fn config(n_patients: usize, n_variables: usize, target_index: usize) -> ProtocolConfig {
    ProtocolConfig {
        n_patients,
        n_variables,
        target_index,
        persist: false,
        seed: Some(2024),
        ..ProtocolConfig::default()
    }
}

fn ckks_backend() -> CkksBackend {
    CkksBackend::new(&CkksParameters::insecure(1024)).unwrap()
}

fn decrypt_all<B: HeBackend>(
    pipeline: &PipelineContext<B>,
    columns: &[optout_proof::dataset::EncryptedColumn<B>],
) -> Vec<Vec<f64>> {
    columns
        .iter()
        .map(|c| c.decrypt(pipeline.backend(), &pipeline.keys().secret_key).unwrap())
        .collect()
}

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!((a - e).abs() < EPS, "slot {i}: got {a}, expected {e}");
    }
}

fn scenario_columns() -> Vec<Vec<f64>> {
    vec![vec![5.0, 7.0, 9.0, 11.0], vec![2.0, 4.0, 6.0, 8.0]]
}

#[test]
fn test_concrete_scenario_clear() {
    let pipeline = PipelineContext::new(ClearBackend::new(8), config(4, 2, 2)).unwrap();
    let dataset = pipeline.encrypt_dataset(&scenario_columns(), 4).unwrap();
    let outcome = pipeline.opt_out(&dataset, 2, 2).unwrap();

    let masked = decrypt_all(&pipeline, &outcome.masked);
    assert_eq!(masked, vec![vec![5.0, 7.0, 0.0, 11.0], vec![2.0, 4.0, 0.0, 8.0]]);
    let checked = decrypt_all(&pipeline, &outcome.verification);
    assert_eq!(checked, vec![vec![0.0; 4], vec![0.0; 4]]);
    assert_eq!(outcome.proof.values, vec![0.0, 0.0]);
}

#[test]
fn test_concrete_scenario_ckks() {
    let pipeline = PipelineContext::new(ckks_backend(), config(4, 2, 2)).unwrap();
    let dataset = pipeline.encrypt_dataset(&scenario_columns(), 4).unwrap();
    let outcome = pipeline.opt_out(&dataset, 2, 2).unwrap();

    let masked = decrypt_all(&pipeline, &outcome.masked);
    assert_close(&masked[0], &[5.0, 7.0, 0.0, 11.0]);
    assert_close(&masked[1], &[2.0, 4.0, 0.0, 8.0]);
    for column in decrypt_all(&pipeline, &outcome.verification) {
        assert_close(&column, &[0.0; 4]);
    }
    assert_eq!(outcome.proof.len(), 2);
    assert!(outcome.proof.confirms_deletion(EPS), "{:?}", outcome.proof);
}

#[test]
fn test_full_run_ckks() {
    let pipeline = PipelineContext::new(ckks_backend(), config(300, 6, 123)).unwrap();
    let report = pipeline.run(&DataGenerator::new(5)).unwrap();

    assert_eq!(report.batch_size, 512);
    assert_eq!(report.proof.len(), 6);
    assert_eq!(report.proof.target_index, 123);
    assert_eq!(report.proof.verify_index, 123);
    assert!(report.proof.max_abs() < EPS, "max |value| {}", report.proof.max_abs());
}

#[test]
fn test_default_parameters_full_cohort_last_row() {
    let config = ProtocolConfig {
        n_variables: 3,
        target_index: 3690,
        persist: false,
        seed: Some(31),
        ..ProtocolConfig::default()
    };
    let backend = CkksBackend::new(&config.ckks_parameters()).unwrap();
    let pipeline = PipelineContext::new(backend, config).unwrap();
    let report = pipeline.run(&DataGenerator::new(31)).unwrap();

    assert_eq!(report.batch_size, 4096);
    assert_eq!(report.n_patients, 3691);
    assert_eq!(report.proof.len(), 3);
    assert_eq!(report.proof.target_index, 3690);
    assert!(report.proof.confirms_deletion(EPS), "{:?}", report.proof.values);
}

#[test]
fn test_masking_preserves_other_rows_ckks() {
    let n_rows = 50;
    let generator = DataGenerator::new(8);
    let pipeline = PipelineContext::new(ckks_backend(), config(n_rows, 3, 0)).unwrap();
    let plaintext = generator.columns(3, n_rows);
    let dataset = pipeline.encrypt_dataset(&plaintext, n_rows).unwrap();
    let outcome = pipeline.opt_out(&dataset, 17, 17).unwrap();

    for (masked, original) in decrypt_all(&pipeline, &outcome.masked).iter().zip(&plaintext) {
        for i in 0..n_rows {
            let expected = if i == 17 { 0.0 } else { original[i] };
            assert!((masked[i] - expected).abs() < EPS, "row {i}");
        }
    }
}

#[test]
fn test_boundary_targets() {
    for target in [0, 9] {
        let pipeline = PipelineContext::new(ckks_backend(), config(10, 2, target)).unwrap();
        let report = pipeline.run(&DataGenerator::new(target as u64)).unwrap();
        assert!(report.proof.confirms_deletion(EPS), "target {target}");
    }
}

#[test]
fn test_out_of_range_target_is_rejected() {
    assert!(matches!(
        PipelineContext::new(ClearBackend::new(16), config(10, 2, 10)),
        Err(OptOutError::RowOutOfRange { index: 10, n_rows: 10 })
    ));

    let pipeline = PipelineContext::new(ClearBackend::new(16), config(10, 2, 0)).unwrap();
    let dataset = pipeline.generate_dataset(&DataGenerator::new(1)).unwrap();
    assert!(matches!(
        pipeline.opt_out(&dataset, 10, 10),
        Err(OptOutError::RowOutOfRange { index: 10, .. })
    ));
}

#[test]
fn test_independent_verify_index_reveals_value() {
    let pipeline = PipelineContext::new(ckks_backend(), config(4, 2, 2)).unwrap();
    let dataset = pipeline.encrypt_dataset(&scenario_columns(), 4).unwrap();
    let outcome = pipeline.opt_out(&dataset, 2, 1).unwrap();

    assert_eq!(outcome.proof.verify_index, 1);
    assert_close(&outcome.proof.values, &[7.0, 4.0]);
    assert!(!outcome.proof.confirms_deletion(EPS));
}

#[test]
fn test_special_datasets_ckks() {
    let n_rows = 8;
    let datasets = [
        vec![vec![0.0; n_rows]; 2],
        vec![vec![17.5; n_rows]; 2],
        vec![(0..n_rows).map(|i| i as f64 * 3.25 - 10.0).collect(); 2],
    ];
    let pipeline = PipelineContext::new(ckks_backend(), config(n_rows, 2, 3)).unwrap();
    for columns in &datasets {
        let dataset = pipeline.encrypt_dataset(columns, n_rows).unwrap();
        let proof = pipeline.opt_out(&dataset, 3, 3).unwrap().proof;
        assert!(proof.confirms_deletion(EPS), "{:?}", proof.values);
    }
}

#[test]
fn test_runs_are_reproducible_across_thread_counts() {
    let mut sequential = config(20, 4, 5);
    sequential.threads = 1;
    let mut parallel = sequential.clone();
    parallel.threads = 3;

    let a = PipelineContext::new(ckks_backend(), sequential).unwrap();
    let b = PipelineContext::new(ckks_backend(), parallel).unwrap();
    let ra = a.run(&DataGenerator::new(9)).unwrap();
    let rb = b.run(&DataGenerator::new(9)).unwrap();
    assert_eq!(ra.proof.values, rb.proof.values);
}

#[test]
fn test_dataset_append_shape_check_through_backend() {
    let backend = ClearBackend::new(8);
    let pipeline = PipelineContext::new(backend, config(4, 1, 0)).unwrap();
    let dataset = pipeline.encrypt_dataset(&scenario_columns(), 4).unwrap();
    let mut grown = EncryptedDataset::from_columns(4, dataset.columns().to_vec()).unwrap();

    let short = pipeline.encrypt_dataset(&[vec![1.0; 3]], 3).unwrap();
    assert!(grown.append(short.get(0).unwrap().clone()).is_err());
    assert_eq!(grown.len(), 2);
}

#[test]
fn test_depth_two_is_required() {
    // Masking and verification need two multiplications
    let pipeline = PipelineContext::new(ClearBackend::with_depth(8, 1), config(4, 2, 1)).unwrap();
    let dataset = pipeline.encrypt_dataset(&scenario_columns(), 4).unwrap();
    assert!(matches!(
        pipeline.opt_out(&dataset, 1, 1),
        Err(OptOutError::DepthExhausted { level: 0 })
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_zeroing_holds_for_any_data(
        (n_rows, target) in (1usize..24).prop_flat_map(|n| (Just(n), 0..n)),
        n_variables in 1usize..5,
        seed in any::<u64>(),
        low in -1000.0f64..1000.0,
        width in 0.001f64..1000.0,
    ) {
        let pipeline = PipelineContext::new(ClearBackend::new(32), config(n_rows, n_variables, target)).unwrap();
        let generator = DataGenerator::with_range(seed, low, low + width).unwrap();
        let dataset = pipeline.generate_dataset(&generator).unwrap();
        let outcome = pipeline.opt_out(&dataset, target, target).unwrap();

        prop_assert_eq!(outcome.masked.len(), n_variables);
        prop_assert_eq!(outcome.verification.len(), n_variables);
        prop_assert_eq!(outcome.proof.len(), n_variables);
        prop_assert!(outcome.proof.values.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn prop_verification_isolates_selected_row(
        (n_rows, target, verify) in (2usize..24).prop_flat_map(|n| (Just(n), 0..n, 0..n)),
        seed in any::<u64>(),
    ) {
        let pipeline = PipelineContext::new(ClearBackend::new(32), config(n_rows, 2, target)).unwrap();
        let generator = DataGenerator::new(seed);
        let plaintext = generator.columns(2, n_rows);
        let dataset = pipeline.encrypt_dataset(&plaintext, n_rows).unwrap();
        let outcome = pipeline.opt_out(&dataset, target, verify).unwrap();

        for (v, column) in plaintext.iter().enumerate() {
            let expected = if verify == target { 0.0 } else { column[verify] };
            prop_assert_eq!(outcome.proof.values[v], expected);
        }
    }
}
