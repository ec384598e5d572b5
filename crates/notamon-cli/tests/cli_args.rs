use std::fs;
use std::path::Path;

use assert_cmd::Command;
use calamine::{open_workbook, Reader, Xlsx};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::cargo_bin("notamon").unwrap()
}

fn write_config(dir: &Path, input: &Path, history: &Path) -> std::path::PathBuf {
    let config = serde_json::json!({
        "paths": { "pdf_input_dir": input, "history_path": history },
        "processing": { "backup_before_save": true, "jobs": 1 }
    });
    let path = dir.join("config.json");
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    path
}

/// Single-page text PDF with one line of text.
fn write_note_pdf(path: &Path, line: &str) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Td", vec![40.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal(line)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

/// Input directory with five readable notes and one corrupt file between them.
fn write_note_dir(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    let trades = [
        ("a_nota.pdf", "1-BOVESPA C VISTA PETR4 ON 100 25,50 2.550,00 D"),
        ("b_nota.pdf", "1-BOVESPA V VISTA VALE3 ON 50 60,00 3.000,00 C"),
        ("d_nota.pdf", "1-BOVESPA C VISTA ITUB4 PN 200 30,10 6.020,00 D"),
        ("e_nota.pdf", "1-BOVESPA V OPCAO PETRC400 100 1,20 120,00 C"),
        ("f_nota.pdf", "1-BOVESPA C VISTA BBAS3 ON 10 50,00 500,00 D"),
    ];
    for (name, line) in trades {
        write_note_pdf(&dir.join(name), line);
    }
    fs::write(dir.join("c_broken.pdf"), b"%PDF-1.4 truncated").unwrap();
}

/// Summary lines with the document and operation counts.
fn count_lines(stdout: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|l| l.contains("Processed") || l.contains("operations extracted"))
        .map(|l| l.trim().to_string())
        .collect()
}

#[test]
fn help_flag_prints_usage_with_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn run_subcommand_help() {
    cmd()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--jobs"));
}

#[test]
fn config_init_writes_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested/config.json");

    cmd()
        .args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default settings"));

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("pdf_input_dir"));
    assert!(content.contains("backup_before_save"));

    // Second init without --force refuses to overwrite.
    cmd()
        .args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn config_show_uses_given_file() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path(), Path::new("/data/notas"), Path::new("ops.xlsx"));

    cmd()
        .arg("-c")
        .arg(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/data/notas (missing)"))
        .stdout(predicate::str::contains("ops.xlsx (sheet \"operacoes\""));
}

#[test]
fn config_show_without_file_reports_defaults() {
    let tmp = TempDir::new().unwrap();

    cmd()
        .arg("-c")
        .arg(tmp.path().join("absent.json"))
        .args(["config", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"sheet_name\": \"operacoes\""));
}

#[test]
fn run_fails_when_input_dir_missing() {
    let tmp = TempDir::new().unwrap();
    let history = tmp.path().join("ops.csv");
    let config = write_config(tmp.path(), &tmp.path().join("missing"), &history);

    cmd()
        .arg("-c")
        .arg(&config)
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("input directory does not exist"));

    assert!(!history.exists());
}

#[test]
fn run_fails_without_config() {
    let tmp = TempDir::new().unwrap();

    cmd()
        .arg("-c")
        .arg(tmp.path().join("absent.json"))
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config init"));
}

#[test]
fn dry_run_on_empty_dir_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("notas");
    fs::create_dir(&input).unwrap();
    let history = tmp.path().join("out/ops.csv");
    let config = write_config(tmp.path(), &input, &history);

    cmd()
        .arg("-c")
        .arg(&config)
        .args(["run", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed 0 notes"))
        .stdout(predicate::str::contains("dry run"));

    assert!(!history.exists());
}

#[test]
fn run_skips_corrupt_pdf_and_writes_header() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("notas");
    fs::create_dir(&input).unwrap();
    fs::write(input.join("broken.pdf"), b"not a pdf").unwrap();
    let history = tmp.path().join("out/ops.csv");
    let config = write_config(tmp.path(), &input, &history);

    cmd()
        .arg("-c")
        .arg(&config)
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 unreadable"));

    let content = fs::read_to_string(&history).unwrap();
    assert!(content.starts_with("document,page,note_number"));
    assert_eq!(content.lines().count(), 1);
}

#[test]
fn parallel_run_matches_sequential_run() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("notas");
    write_note_dir(&input);

    let par_dir = tmp.path().join("par");
    let seq_dir = tmp.path().join("seq");
    fs::create_dir_all(&par_dir).unwrap();
    fs::create_dir_all(&seq_dir).unwrap();
    let par_history = par_dir.join("ops.csv");
    let seq_history = seq_dir.join("ops.csv");
    let par_config = write_config(&par_dir, &input, &par_history);
    let seq_config = write_config(&seq_dir, &input, &seq_history);

    let dry = cmd()
        .arg("-c")
        .arg(&par_config)
        .args(["run", "-j", "4", "--dry-run"])
        .output()
        .unwrap();
    assert!(dry.status.success());
    assert!(!par_history.exists());

    let par = cmd()
        .arg("-c")
        .arg(&par_config)
        .args(["run", "-j", "4"])
        .output()
        .unwrap();
    let seq = cmd()
        .arg("-c")
        .arg(&seq_config)
        .args(["run", "-j", "1"])
        .output()
        .unwrap();
    assert!(par.status.success());
    assert!(seq.status.success());

    let counts = count_lines(&seq.stdout);
    assert_eq!(counts.len(), 2);
    assert!(counts[0].contains("Processed 6 notes (1 unreadable)"));
    assert_eq!(count_lines(&dry.stdout), counts);
    assert_eq!(count_lines(&par.stdout), counts);

    let par_rows = fs::read_to_string(&par_history).unwrap();
    let seq_rows = fs::read_to_string(&seq_history).unwrap();
    assert!(par_rows.lines().count() > 1);
    assert_eq!(par_rows, seq_rows);

    // Rows follow file-name order whatever the scheduling.
    let documents: Vec<&str> = seq_rows
        .lines()
        .skip(1)
        .filter_map(|l| l.split(',').next())
        .collect();
    let mut sorted = documents.clone();
    sorted.sort();
    assert_eq!(documents, sorted);
}

#[test]
fn run_writes_spreadsheet_history() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("notas");
    write_note_dir(&input);
    let history = tmp.path().join("out/ops.xlsx");
    let config = write_config(tmp.path(), &input, &history);

    cmd()
        .arg("-c")
        .arg(&config)
        .arg("run")
        .assert()
        .success();

    let mut workbook: Xlsx<_> = open_workbook(&history).unwrap();
    let range = workbook.worksheet_range("operacoes").unwrap();
    let header: Vec<String> = range.rows().next().unwrap().iter().map(|c| c.to_string()).collect();
    assert_eq!(header.first().map(String::as_str), Some("document"));
    assert_eq!(header.last().map(String::as_str), Some("alert_int"));
    assert!(range.height() > 1);
}

#[test]
fn extract_without_matches_fails() {
    let tmp = TempDir::new().unwrap();
    let pattern = format!("{}/*.pdf", tmp.path().display());

    cmd()
        .args(["extract", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching PDF files"));
}
