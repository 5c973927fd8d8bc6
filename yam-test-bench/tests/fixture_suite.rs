extern crate libtest_mimic;

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use libtest_mimic::{Arguments, Failed, Trial};
use tracing_subscriber::EnvFilter;
use yam_test_bench::event_notation;

#[derive(Default)]
struct TestData {
    desc: String,
    input_yaml: PathBuf,
    is_error: bool,
    test_event: PathBuf,
}

fn perform_test(data: TestData) -> Result<(), Failed> {
    let input_yaml = fs::read_to_string(&data.input_yaml)?;
    let actual = event_notation(&input_yaml, true);
    let is_error = actual.ends_with("ERR");
    if data.is_error || is_error {
        if is_error != data.is_error {
            return Err(format!("expected error: {}, got:{actual}", data.is_error).into());
        }
        return Ok(());
    }
    let expected = fs::read_to_string(&data.test_event)?;
    if actual.trim_start() != expected.trim_end() {
        return Err(format!("expected:\n{expected}\ngot:{actual}").into());
    }
    Ok(())
}

fn collect_test(dir_name: String, test_dir_path: &Path) -> Result<Trial, Box<dyn Error>> {
    let mut test_data = TestData::default();
    for entry in fs::read_dir(test_dir_path)? {
        let entry = entry?;
        let filename = entry.file_name().into_string().unwrap_or_default();
        match &*filename {
            "===" => {
                if let Ok(desc) = fs::read_to_string(entry.path()) {
                    test_data.desc = String::from(desc.trim());
                }
            }
            "in.yaml" => test_data.input_yaml = entry.path(),
            "error" => test_data.is_error = true,
            "test.event" => test_data.test_event = entry.path(),
            _ => {}
        }
    }
    let name = format!("{} ({})", dir_name, test_data.desc);
    Ok(Trial::test(name, move || perform_test(test_data)))
}

fn collect_tests(path: &Path) -> Result<Vec<Trial>, Box<dyn Error>> {
    let mut tests = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            let dir_name = entry.file_name().into_string().unwrap_or_default();
            tests.push(collect_test(dir_name, &entry.path())?);
        }
    }
    tests.sort_by(|a, b| a.name().cmp(b.name()));
    Ok(tests)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Arguments::from_args();
    // RUST_LOG=yam_core=trace shows every scanned token and emitted event
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");

    let tests = collect_tests(&path)?;

    libtest_mimic::run(&args, tests).exit();
}
