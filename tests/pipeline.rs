//! End-to-end pipeline coverage: data file in, trained model + reports out.

use std::path::PathBuf;

use tabreg::{run, Network, RunConfig};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("tabreg-pipeline-{}-{name}", std::process::id()))
}

/// The canonical small scenario: one input, one output, y = 10x.
fn write_linear_data(path: &PathBuf) {
    std::fs::write(path, "x1 y1\n1 10\n2 20\n3 30\n4 40\n").unwrap();
}

#[test]
fn full_run_trains_saves_and_dumps() {
    let data_path = temp_path("data.txt");
    let dump_path = temp_path("dump.txt");
    let model_path = temp_path("model.json");
    write_linear_data(&data_path);

    let mut cfg = RunConfig::new(data_path.clone(), 1, 1);
    cfg.output_data_path = Some(dump_path.clone());
    cfg.save_model_path = Some(model_path.clone());
    cfg.hidden_layers = vec![4];
    cfg.train.epochs = 5;
    cfg.train.learning_rate = 0.01;

    run::run(&cfg).unwrap();

    // The dump reuses the input header and round-trips the raw values.
    let dump = std::fs::read_to_string(&dump_path).unwrap();
    let mut lines = dump.lines();
    assert_eq!(lines.next(), Some("x1 y1"));
    let first_row: Vec<f32> = lines
        .next()
        .unwrap()
        .split_whitespace()
        .map(|v| v.parse().unwrap())
        .collect();
    assert!((first_row[0] - 1.0).abs() < 1e-3);
    assert!((first_row[1] - 10.0).abs() < 1e-2);

    // The saved model loads back with the right shape.
    let loaded = Network::load_json(&model_path).unwrap();
    assert_eq!(loaded.input_dim(), 1);
    assert_eq!(loaded.output_dim(), 1);

    for p in [&data_path, &dump_path, &model_path] {
        std::fs::remove_file(p).unwrap();
    }
}

#[test]
fn loading_a_saved_model_resumes_from_its_parameters() {
    let data_path = temp_path("resume-data.txt");
    let model_path = temp_path("resume-model.json");
    write_linear_data(&data_path);

    let mut cfg = RunConfig::new(data_path.clone(), 1, 1);
    cfg.save_model_path = Some(model_path.clone());
    cfg.hidden_layers = vec![4];
    cfg.train.epochs = 5;

    run::run(&cfg).unwrap();

    // Second run loads the saved parameters instead of a fresh network.
    let mut cfg2 = RunConfig::new(data_path.clone(), 1, 1);
    cfg2.load_model_path = Some(model_path.clone());
    cfg2.hidden_layers = vec![4];
    cfg2.train.epochs = 5;

    run::run(&cfg2).unwrap();

    std::fs::remove_file(&data_path).unwrap();
    std::fs::remove_file(&model_path).unwrap();
}

#[test]
fn missing_data_file_fails_the_run() {
    let cfg = RunConfig::new(temp_path("no-such-file.txt"), 1, 1);
    assert!(run::run(&cfg).is_err());
}

#[test]
fn malformed_data_file_fails_the_run() {
    let data_path = temp_path("bad-data.txt");
    std::fs::write(&data_path, "x1 y1\n1 10\nnot-a-number 20\n").unwrap();

    let cfg = RunConfig::new(data_path.clone(), 1, 1);
    assert!(run::run(&cfg).is_err());

    std::fs::remove_file(&data_path).unwrap();
}
