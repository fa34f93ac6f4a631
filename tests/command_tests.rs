use loadtest_analyzer::commands::{execute_analyze, validate_args, AnalyzeArgs};
use loadtest_analyzer::output::read_result;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

const LOG: &str = "\
timeStamp,elapsed,label,success,bytes
1000,100,/main,true,10
2000,300,/main/sub,false,30
";

fn write_log(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_validate_args_valid() {
    let args = AnalyzeArgs {
        input: PathBuf::from("results.jtl"),
        groups: vec!["blob=/main/**".to_string()],
        ..Default::default()
    };

    assert!(validate_args(&args).is_ok());
}

#[test]
fn test_validate_args_bad_group() {
    let args = AnalyzeArgs {
        groups: vec!["=/main".to_string()],
        ..Default::default()
    };

    assert!(validate_args(&args).is_err());
}

#[test]
fn test_analyze_writes_result() {
    let log = write_log(LOG);
    let out_dir = tempfile::tempdir().unwrap();
    let output = out_dir.path().join("result.json");

    let args = AnalyzeArgs {
        input: log.path().to_path_buf(),
        groups: vec!["page=/main".to_string(), "blob=/main/**".to_string()],
        output_json: Some(output.clone()),
        ..Default::default()
    };

    let result = execute_analyze(args).unwrap();
    assert_eq!(result.global().count, 2);

    let written = read_result(&output).unwrap();
    assert_eq!(written, result);
    assert_eq!(written.get("blob").unwrap().error_count, 1);
}

#[test]
fn test_analyze_with_config_file() {
    let log = write_log(LOG);
    let config = write_log(
        r#"{ "max_samples": 1, "groups": [ { "name": "sub", "pattern": "/main/sub" } ] }"#,
    );

    let args = AnalyzeArgs {
        input: log.path().to_path_buf(),
        config_file: Some(config.path().to_path_buf()),
        output_json: None,
        print_summary: true,
        ..Default::default()
    };

    let result = execute_analyze(args).unwrap();
    assert_eq!(result.names(), vec!["__all__", "sub"]);
    assert_eq!(result.global().duration.as_ref().unwrap().retained, 1);
}

#[test]
fn test_truncated_log_fails_unless_allowed() {
    let log = write_log(&format!("{}3000,broken", LOG));
    let out_dir = tempfile::tempdir().unwrap();
    let output = out_dir.path().join("partial.json");

    let strict = AnalyzeArgs {
        input: log.path().to_path_buf(),
        output_json: Some(output.clone()),
        ..Default::default()
    };
    assert!(execute_analyze(strict.clone()).is_err());
    // Partial output is still written
    assert_eq!(read_result(&output).unwrap().global().count, 2);

    let lenient = AnalyzeArgs {
        allow_partial: true,
        ..strict
    };
    assert_eq!(execute_analyze(lenient).unwrap().global().count, 2);
}

#[test]
fn test_invalid_config_fails() {
    let log = write_log(LOG);
    let args = AnalyzeArgs {
        input: log.path().to_path_buf(),
        groups: vec!["a=/x".to_string(), "a=/y".to_string()],
        output_json: None,
        print_summary: true,
        ..Default::default()
    };

    assert!(execute_analyze(args).is_err());
}
