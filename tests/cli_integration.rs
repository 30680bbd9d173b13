use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn repertoire(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("repertoire").unwrap();
    cmd.env("REPERTOIRE_HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("REPERTOIRE_LOG")
        .current_dir(home.path());
    cmd
}

fn add_italian(home: &TempDir) {
    repertoire(home)
        .args(["add", "Italian", "1.", "e4", "e5", "2.", "Nf3", "-c", "Open Games"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Opening \"Italian\" saved successfully!"));
}

#[test]
fn add_then_list_and_status() {
    let home = TempDir::new().unwrap();
    add_italian(&home);

    repertoire(&home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Italian"))
        .stdout(predicate::str::contains("Open Games"))
        .stdout(predicate::str::contains("due"));

    repertoire(&home)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Openings: 1"))
        .stdout(predicate::str::contains("Due now:  1"));

    assert!(home.path().join("store.json").exists());
}

#[test]
fn empty_store_lists_nothing() {
    let home = TempDir::new().unwrap();
    repertoire(&home)
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved openings yet."));
}

#[test]
fn duplicate_names_need_force() {
    let home = TempDir::new().unwrap();
    add_italian(&home);

    repertoire(&home)
        .args(["add", "Italian", "e4", "e5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Use --force"));

    repertoire(&home)
        .args(["add", "Italian", "e4", "e5", "--force"])
        .assert()
        .success();
}

#[test]
fn illegal_lines_are_rejected() {
    let home = TempDir::new().unwrap();
    repertoire(&home)
        .args(["add", "Broken", "e4", "e4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Illegal move 'e4' at ply 2"));
}

#[test]
fn review_from_piped_input_schedules_the_line() {
    let home = TempDir::new().unwrap();
    add_italian(&home);

    repertoire(&home)
        .arg("review")
        .write_stdin("e4\nNf3\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Opponent plays e5"))
        .stdout(predicate::str::contains("Perfect! Line completed without mistakes."))
        .stdout(predicate::str::contains("All done! Completed 1 opening this session!"));

    repertoire(&home)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Due now:  0"));

    repertoire(&home)
        .arg("review")
        .assert()
        .success()
        .stdout(predicate::str::contains("Completed 0 openings"));
}

#[test]
fn learn_unknown_key_fails() {
    let home = TempDir::new().unwrap();
    repertoire(&home)
        .args(["learn", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Opening not found: ghost"));
}

#[test]
fn export_wipe_import_round_trip() {
    let home = TempDir::new().unwrap();
    add_italian(&home);

    let output = repertoire(&home)
        .args(["export", "--stdout"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let backup_path = home.path().join("backup.json");
    std::fs::write(&backup_path, &output.stdout).unwrap();

    repertoire(&home)
        .args(["wipe", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All data has been deleted."));
    repertoire(&home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved openings yet."));

    repertoire(&home)
        .arg("import")
        .arg(&backup_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully imported 1 opening(s)!"));
    repertoire(&home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Italian"));
}

#[test]
fn export_defaults_to_dated_file() {
    let home = TempDir::new().unwrap();
    add_italian(&home);
    repertoire(&home)
        .arg("export")
        .assert()
        .success()
        .stdout(predicate::str::contains("chess-openings-backup-"));

    let written = std::fs::read_dir(home.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .any(|e| {
            e.file_name()
                .to_string_lossy()
                .starts_with("chess-openings-backup-")
        });
    assert!(written);
}

#[test]
fn import_rejects_garbage() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("bad.json");
    std::fs::write(&path, r#"{"theme": "blue"}"#).unwrap();
    repertoire(&home)
        .arg("import")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid backup file format"));
}

#[test]
fn wipe_without_yes_asks_and_can_abort() {
    let home = TempDir::new().unwrap();
    add_italian(&home);

    repertoire(&home)
        .arg("wipe")
        .write_stdin("y\nn\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Aborted."));

    repertoire(&home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Italian"));

    repertoire(&home)
        .arg("wipe")
        .write_stdin("y\ny\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("All data has been deleted."));
}

#[test]
fn pgn_import_from_file() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("games.pgn");
    std::fs::write(
        &path,
        "[Event \"Club\"]\n[Opening \"Ruy Lopez\"]\n\n1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 1-0\n\n\
         [Event \"Blitz\"]\n[Black \"player\"]\n\n1. d4 d5 2. c4 *\n",
    )
    .unwrap();

    repertoire(&home)
        .arg("import-pgn")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 opening(s)"));

    repertoire(&home)
        .args(["list", "--color", "black"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Blitz_"))
        .stdout(predicate::str::contains("Ruy Lopez").not());
}

#[test]
fn config_get_and_set() {
    let home = TempDir::new().unwrap();
    repertoire(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("boardTheme: blue"))
        .stdout(predicate::str::contains("clickToMove: true"));

    repertoire(&home)
        .args(["config", "darkMode", "on"])
        .assert()
        .success()
        .stdout(predicate::str::contains("darkMode set to true"));

    repertoire(&home)
        .args(["config", "darkMode"])
        .assert()
        .success()
        .stdout(predicate::str::contains("darkMode: true"));

    repertoire(&home)
        .args(["config", "volume"])
        .assert()
        .failure();
}

#[test]
fn edit_and_delete() {
    let home = TempDir::new().unwrap();
    add_italian(&home);

    repertoire(&home)
        .args(["edit", "Italian", "--category", "Favorites", "--as", "black"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Opening info updated!"));

    repertoire(&home)
        .args(["show", "Italian"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Category:    Favorites"))
        .stdout(predicate::str::contains("Playing as:  black"));

    repertoire(&home)
        .args(["delete", "Italian"])
        .assert()
        .success();
    repertoire(&home)
        .args(["show", "Italian"])
        .assert()
        .failure();
}

#[test]
fn grouped_help() {
    let home = TempDir::new().unwrap();
    repertoire(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Line Commands:"))
        .stdout(predicate::str::contains("Drill Commands:"))
        .stdout(predicate::str::contains("reset-progress"));
}
