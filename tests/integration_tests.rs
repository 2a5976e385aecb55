/// Integration tests for onlyfiles
///
/// These tests drive the library end to end against real temporary
/// directories: organizing, logging, reverting and backups.
///
/// Test categories:
/// 1. Organization by type, extension, size and date
/// 2. Collisions and partial failures
/// 3. Operation log round trips
/// 4. Reverting batches and selections
/// 5. Configuration and exclusions
/// 6. Backups
use chrono::{Duration as ChronoDuration, Local, NaiveDateTime};
use filetime::FileTime;
use onlyfiles::backup;
use onlyfiles::config::{Config, ExcludeRules, FilterRules};
use onlyfiles::file_category::{ClassificationMode, DateLayout, TypeTable, date_bucket};
use onlyfiles::file_organizer::FileOrganizer;
use onlyfiles::operation_log::{LogEvent, LogRecord, OperationLog};
use onlyfiles::path_validator::absolute;
use onlyfiles::undo::{MoveRecord, UndoManager, move_records};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary workspace: a `downloads` directory to organize and a separate
/// `state` directory holding the operation log.
struct TestFixture {
    temp_dir: TempDir,
    log: Arc<OperationLog>,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(temp_dir.path().join("downloads")).expect("Failed to create workspace");
        let log = Arc::new(OperationLog::new(
            temp_dir.path().join("state").join("operations.log"),
        ));
        TestFixture { temp_dir, log }
    }

    /// The directory being organized.
    fn path(&self) -> PathBuf {
        absolute(&self.temp_dir.path().join("downloads"))
    }

    fn create_file(&self, name: &str, content: &[u8]) {
        let file_path = self.path().join(name);
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content).expect("Failed to write file content");
    }

    fn create_text_file(&self, name: &str, content: &str) {
        self.create_file(name, content.as_bytes());
    }

    fn create_files(&self, names: &[&str]) {
        for name in names {
            self.create_text_file(name, name);
        }
    }

    fn create_subdir(&self, name: &str) {
        fs::create_dir_all(self.path().join(name)).expect("Failed to create subdirectory");
    }

    fn assert_dir_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_dir(), "Directory should exist: {}", path.display());
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_file_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    fn organizer(&self) -> FileOrganizer {
        FileOrganizer::builder(Arc::clone(&self.log))
            .build()
            .expect("Failed to build organizer")
    }

    fn organizer_with(&self, config: &Config) -> FileOrganizer {
        FileOrganizer::builder(Arc::clone(&self.log))
            .table(config.category_table().expect("Invalid table"))
            .filters(&config.filters)
            .build()
            .expect("Failed to build organizer")
    }

    fn undo(&self) -> UndoManager {
        UndoManager::new(Arc::clone(&self.log), Duration::from_secs(5))
    }

    fn log_lines(&self) -> Vec<String> {
        self.log.read_all().expect("Failed to read log")
    }

    /// Appends a move record with a fixed timestamp.
    fn record_move(&self, name: &str, category: &str, timestamp: NaiveDateTime) {
        let destination = self.path().join(category);
        self.log
            .append(&LogRecord::from_event(
                &LogEvent::Moved {
                    filename: name,
                    destination: &destination,
                },
                timestamp,
            ))
            .expect("Failed to append record");
    }

    /// All files under the workspace, relative and sorted.
    fn list_files_recursive(&self) -> Vec<String> {
        let mut files = Vec::new();
        Self::walk_dir(&self.path(), &self.path(), &mut files);
        files.sort();
        files
    }

    fn walk_dir(root: &Path, dir: &Path, files: &mut Vec<String>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() {
                    let relative = path.strip_prefix(root).unwrap_or(&path);
                    files.push(relative.to_string_lossy().replace('\\', "/"));
                } else if path.is_dir() {
                    Self::walk_dir(root, &path, files);
                }
            }
        }
    }
}

fn at(offset_secs: i64) -> NaiveDateTime {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    base + ChronoDuration::seconds(offset_secs)
}

// ============================================================================
// Test Suite 1: Organization
// ============================================================================

#[test]
fn test_type_mode_sorts_images_and_documents() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.txt"]);

    let result = fixture
        .organizer()
        .organize(&fixture.path(), ClassificationMode::Type)
        .unwrap();

    fixture.assert_file_exists("Images/a.jpg");
    fixture.assert_file_exists("Documents/b.txt");
    assert_eq!(result.files("Images"), ["a.jpg"]);
    assert_eq!(result.files("Documents"), ["b.txt"]);
    assert_eq!(move_records(&fixture.log_lines()).len(), 2);
}

#[test]
fn test_unknown_extension_goes_to_others() {
    let fixture = TestFixture::new();
    fixture.create_file("x.bin", &[0x00, 0x01, 0x02]);

    fixture
        .organizer()
        .organize(&fixture.path(), ClassificationMode::Type)
        .unwrap();

    fixture.assert_file_exists("Others/x.bin");
    fixture.assert_file_not_exists("x.bin");
}

#[test]
fn test_size_mode_ignores_file_age() {
    let fixture = TestFixture::new();
    fixture.create_file("report.pdf", &vec![0u8; 2 * 1024 * 1024]);
    let forty_days_ago = SystemTime::now() - Duration::from_secs(40 * 24 * 60 * 60);
    filetime::set_file_mtime(
        fixture.path().join("report.pdf"),
        FileTime::from_system_time(forty_days_ago),
    )
    .unwrap();

    fixture
        .organizer()
        .organize(&fixture.path(), ClassificationMode::Size)
        .unwrap();

    fixture.assert_file_exists("medium/report.pdf");
}

#[test]
fn test_size_mode_buckets() {
    let fixture = TestFixture::new();
    fixture.create_file("note.txt", b"hi");
    fixture.create_file("page.html", &vec![b'x'; 4096]);

    let result = fixture
        .organizer()
        .organize(&fixture.path(), ClassificationMode::Size)
        .unwrap();

    assert_eq!(result.files("tiny"), ["note.txt"]);
    assert_eq!(result.files("small"), ["page.html"]);
}

#[test]
fn test_extension_mode_uses_lowercase_extension() {
    let fixture = TestFixture::new();
    fixture.create_files(&["Song.MP3", "Makefile", "archive.tar.gz"]);

    fixture
        .organizer()
        .organize(&fixture.path(), ClassificationMode::Extension)
        .unwrap();

    fixture.assert_file_exists("mp3/Song.MP3");
    fixture.assert_file_exists("no_extension/Makefile");
    fixture.assert_file_exists("gz/archive.tar.gz");
}

#[test]
fn test_date_mode_uses_file_time() {
    let fixture = TestFixture::new();
    fixture.create_text_file("scan.png", "png");
    let metadata = fs::metadata(fixture.path().join("scan.png")).unwrap();
    let created = metadata.created().or_else(|_| metadata.modified()).unwrap();
    let expected = date_bucket(chrono::DateTime::<Local>::from(created), DateLayout::Flat);

    let result = fixture
        .organizer()
        .organize(&fixture.path(), ClassificationMode::Date(DateLayout::Flat))
        .unwrap();

    assert_eq!(result.files(&expected), ["scan.png"]);
    fixture.assert_file_exists(&format!("{}/scan.png", expected));
}

#[test]
fn test_v2_table_from_config() {
    let fixture = TestFixture::new();
    fixture.create_files(&["main.py", "backup.zip", "clip.webm"]);
    let mut config = Config::default();
    config.organize.table = TypeTable::V2;

    fixture
        .organizer_with(&config)
        .organize(&fixture.path(), ClassificationMode::Type)
        .unwrap();

    fixture.assert_file_exists("code/main.py");
    fixture.assert_file_exists("archives/backup.zip");
    fixture.assert_file_exists("others/clip.webm");
}

#[test]
fn test_empty_category_folders_are_not_created() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg"]);

    fixture
        .organizer()
        .organize(&fixture.path(), ClassificationMode::Type)
        .unwrap();

    fixture.assert_dir_exists("Images");
    assert!(!fixture.path().join("Documents").exists());
    assert!(!fixture.path().join("Others").exists());
}

#[test]
fn test_subdirectories_are_left_alone() {
    let fixture = TestFixture::new();
    fixture.create_subdir("projects/rust");
    fixture.create_files(&["a.txt"]);
    fs::write(fixture.path().join("projects").join("inner.jpg"), "x").unwrap();

    fixture
        .organizer()
        .organize(&fixture.path(), ClassificationMode::Type)
        .unwrap();

    fixture.assert_file_exists("projects/inner.jpg");
    fixture.assert_file_exists("Documents/a.txt");
}

#[test]
fn test_missing_directory_yields_empty_result() {
    let fixture = TestFixture::new();
    let result = fixture
        .organizer()
        .organize(&fixture.path().join("nope"), ClassificationMode::Type)
        .unwrap();
    assert!(result.is_empty());
    assert!(fixture.log_lines().is_empty());
}

#[test]
fn test_dry_run_moves_nothing() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.txt"]);

    let result = fixture
        .organizer()
        .preview(&fixture.path(), ClassificationMode::Type)
        .unwrap();

    assert_eq!(result.total_moved(), 2);
    fixture.assert_file_exists("a.jpg");
    fixture.assert_file_exists("b.txt");
    assert!(fixture.log_lines().is_empty());
}

#[test]
fn test_classification_is_total() {
    let table = TypeTable::V1.table();
    let names = [
        "a.jpg", "A.JPG", "b", ".bashrc", "c.", "d.tar.gz", "e.unknownext", "f g.Pdf", "ü.mp3",
    ];
    for name in names {
        let category = table.classify(name);
        assert!(
            category == table.catch_all() || table.category_names().any(|c| c == category),
            "{} classified into unknown category {}",
            name,
            category
        );
        if !table.is_known(name) {
            assert_eq!(category, "Others");
        }
    }
}

// ============================================================================
// Test Suite 2: Collisions and partial failures
// ============================================================================

#[test]
fn test_collision_keeps_both_files() {
    let fixture = TestFixture::new();
    fixture.create_subdir("Images");
    fs::write(fixture.path().join("Images").join("photo.jpg"), "original").unwrap();
    fixture.create_text_file("photo.jpg", "incoming");

    let result = fixture
        .organizer()
        .organize(&fixture.path(), ClassificationMode::Type)
        .unwrap();

    let moved_name = &result.files("Images")[0];
    assert!(moved_name.starts_with("photo_") && moved_name.ends_with(".jpg"));
    assert_eq!(
        fs::read_to_string(fixture.path().join("Images").join("photo.jpg")).unwrap(),
        "original"
    );
    assert_eq!(
        fs::read_to_string(fixture.path().join("Images").join(moved_name)).unwrap(),
        "incoming"
    );

    let records = move_records(&fixture.log_lines());
    assert_eq!(records[0].filename, *moved_name);
}

#[test]
fn test_one_unmovable_file_does_not_stop_the_batch() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.txt", "c.mp3"]);
    // A protected regular file named "Images" blocks the Images folder.
    fixture.create_text_file("Images", "not a folder");
    let organizer = FileOrganizer::builder(Arc::clone(&fixture.log))
        .exclude_file("Images")
        .build()
        .unwrap();

    let result = organizer
        .organize(&fixture.path(), ClassificationMode::Type)
        .unwrap();

    assert_eq!(result.total_moved(), 2);
    assert_eq!(result.failed.len(), 1);
    assert!(result.failed[0].0.ends_with("a.jpg"));
    fixture.assert_file_exists("a.jpg");
    fixture.assert_file_exists("Documents/b.txt");
    fixture.assert_file_exists("Music/c.mp3");

    let lines = fixture.log_lines();
    assert_eq!(lines.len(), 3);
    assert_eq!(move_records(&lines).len(), 2);
}

// ============================================================================
// Test Suite 3: Operation log
// ============================================================================

#[test]
fn test_log_round_trips_moves() {
    let fixture = TestFixture::new();
    fixture.create_files(&["my \"quoted\" file.txt", "x y.png"]);

    fixture
        .organizer()
        .organize(&fixture.path(), ClassificationMode::Type)
        .unwrap();

    let lines = fixture.log_lines();
    let mut parsed: Vec<(String, PathBuf)> = lines
        .iter()
        .map(|line| {
            let record = MoveRecord::parse(line).unwrap();
            (record.filename, record.destination)
        })
        .collect();
    parsed.sort();

    assert_eq!(
        parsed,
        vec![
            ("my \"quoted\" file.txt".to_string(), fixture.path().join("Documents")),
            ("x y.png".to_string(), fixture.path().join("Images")),
        ]
    );
}

#[test]
fn test_rendered_line_round_trips() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg"]);

    fixture
        .organizer()
        .organize(&fixture.path(), ClassificationMode::Type)
        .unwrap();

    let line = &fixture.log_lines()[0];
    let rendered = LogRecord::from_json_line(line).unwrap().render();
    assert!(rendered.contains(" - INFO - File \"a.jpg\" moved to folder \""));

    let from_json = MoveRecord::parse(line).unwrap();
    let from_text = MoveRecord::parse(&rendered).unwrap();
    assert_eq!(from_json, from_text);
}

#[test]
fn test_clear_empties_the_log() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg"]);
    fixture
        .organizer()
        .organize(&fixture.path(), ClassificationMode::Type)
        .unwrap();
    assert_eq!(fixture.log_lines().len(), 1);

    fixture.log.clear().unwrap();

    assert!(fixture.log.path().exists());
    assert!(fixture.log_lines().is_empty());
}

#[test]
fn test_shared_log_across_threads() {
    let fixture = TestFixture::new();
    let dirs: Vec<PathBuf> = (0..4)
        .map(|i| {
            let dir = fixture.temp_dir.path().join(format!("dir{}", i));
            fs::create_dir(&dir).unwrap();
            for j in 0..10 {
                fs::write(dir.join(format!("file{}.txt", j)), "x").unwrap();
            }
            dir
        })
        .collect();

    std::thread::scope(|scope| {
        for dir in &dirs {
            let log = Arc::clone(&fixture.log);
            scope.spawn(move || {
                let organizer = FileOrganizer::builder(log).build().unwrap();
                organizer.organize(dir, ClassificationMode::Type).unwrap();
            });
        }
    });

    let lines = fixture.log_lines();
    assert_eq!(lines.len(), 40);
    assert!(lines.iter().all(|line| MoveRecord::parse(line).is_ok()));
}

// ============================================================================
// Test Suite 4: Reverting
// ============================================================================

#[test]
fn test_revert_last_batch_only_reverts_latest_group() {
    let fixture = TestFixture::new();
    fixture.create_subdir("Images");
    for name in ["one.jpg", "two.jpg", "three.jpg"] {
        fs::write(fixture.path().join("Images").join(name), name).unwrap();
    }
    fixture.record_move("one.jpg", "Images", at(0));
    fixture.record_move("two.jpg", "Images", at(2));
    fixture.record_move("three.jpg", "Images", at(32));

    let report = fixture.undo().undo_last().unwrap();

    assert_eq!(report.restored_files, 1);
    fixture.assert_file_exists("three.jpg");
    fixture.assert_file_exists("Images/one.jpg");
    fixture.assert_file_exists("Images/two.jpg");

    // The reverted move no longer counts; the next undo takes the earlier pair.
    let report = fixture.undo().undo_last().unwrap();
    assert_eq!(report.restored_files, 2);
    fixture.assert_file_exists("one.jpg");
    fixture.assert_file_exists("two.jpg");
}

#[test]
fn test_revert_then_reorganize_reproduces_layout() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.txt", "c.mp3", "d.mkv", "e.xyz"]);

    fixture
        .organizer()
        .organize(&fixture.path(), ClassificationMode::Type)
        .unwrap();
    let organized = fixture.list_files_recursive();

    let report = fixture.undo().undo_last().unwrap();
    assert_eq!(report.restored_files, 5);
    assert!(report.is_complete_success());
    assert_eq!(
        fixture.list_files_recursive(),
        vec!["a.jpg", "b.txt", "c.mp3", "d.mkv", "e.xyz"]
    );

    fixture
        .organizer()
        .organize(&fixture.path(), ClassificationMode::Type)
        .unwrap();
    assert_eq!(fixture.list_files_recursive(), organized);
}

#[test]
fn test_revert_skips_files_that_moved_away() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.jpg"]);
    fixture
        .organizer()
        .organize(&fixture.path(), ClassificationMode::Type)
        .unwrap();
    fs::remove_file(fixture.path().join("Images").join("a.jpg")).unwrap();

    let report = fixture.undo().undo_last().unwrap();

    assert_eq!(report.restored_files, 1);
    assert_eq!(report.skipped_files.len(), 1);
    fixture.assert_file_exists("b.jpg");
}

#[test]
fn test_revert_steps_past_batch_with_missing_file() {
    let fixture = TestFixture::new();
    fixture.create_subdir("Documents");
    fixture.create_subdir("Images");
    fs::write(fixture.path().join("Documents").join("old.txt"), "old").unwrap();
    fixture.record_move("old.txt", "Documents", at(0));
    // gone.jpg was deleted after it was moved.
    fixture.record_move("gone.jpg", "Images", at(50));

    let report = fixture.undo().undo_last().unwrap();
    assert_eq!(report.restored_files, 0);
    assert_eq!(report.skipped_files.len(), 1);
    fixture.assert_file_exists("Documents/old.txt");

    let report = fixture.undo().undo_last().unwrap();
    assert_eq!(report.restored_files, 1);
    assert!(report.skipped_files.is_empty());
    fixture.assert_file_exists("old.txt");

    assert!(fixture.undo().undo_last().unwrap().is_empty());
}

#[test]
fn test_revert_selected_indices() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.txt", "c.mp3"]);
    fixture
        .organizer()
        .organize(&fixture.path(), ClassificationMode::Type)
        .unwrap();

    let lines = fixture.log_lines();
    let records = move_records(&lines);
    let index = records.iter().position(|r| r.filename == "b.txt").unwrap();

    let report = fixture.undo().revert_selected(&lines, &[index]).unwrap();

    assert_eq!(report.restored_files, 1);
    fixture.assert_file_exists("b.txt");
    fixture.assert_file_exists("Images/a.jpg");
    fixture.assert_file_exists("Music/c.mp3");
}

#[test]
fn test_revert_reads_human_and_legacy_lines() {
    let fixture = TestFixture::new();
    fixture.create_subdir("Documents");
    fixture.create_subdir("Music");
    fs::write(fixture.path().join("Documents").join("notes.txt"), "n").unwrap();
    fs::write(fixture.path().join("Music").join("song.mp3"), "s").unwrap();

    let docs = fixture.path().join("Documents");
    let music = fixture.path().join("Music");
    let content = format!(
        "2024-01-01 12:00:00 - INFO - File \"notes.txt\" moved to folder \"{}\".\n\
         2024-01-01 12:00:01 - INFO - malformed \"line\n\
         2024-01-01 12:00:02 - INFO - Moved song.mp3 to {}\n",
        docs.display(),
        music.display()
    );
    fs::create_dir_all(fixture.log.path().parent().unwrap()).unwrap();
    fs::write(fixture.log.path(), content).unwrap();

    let report = fixture.undo().undo_last().unwrap();

    assert_eq!(report.restored_files, 2);
    fixture.assert_file_exists("notes.txt");
    fixture.assert_file_exists("song.mp3");
}

#[test]
fn test_undo_with_empty_log() {
    let fixture = TestFixture::new();
    let report = fixture.undo().undo_last().unwrap();
    assert!(report.is_empty());
}

// ============================================================================
// Test Suite 5: Configuration and exclusions
// ============================================================================

#[test]
fn test_excluded_entries_are_never_moved_or_logged() {
    let fixture = TestFixture::new();
    fixture.create_files(&["keep.txt", "move.txt", "draft.part", "operations.log"]);
    let config = Config {
        filters: FilterRules {
            exclude: ExcludeRules {
                filenames: vec!["keep.txt".to_string()],
                extensions: vec!["part".to_string()],
                ..Default::default()
            },
            ..FilterRules::default()
        },
        ..Config::default()
    };

    fixture
        .organizer_with(&config)
        .organize(&fixture.path(), ClassificationMode::Type)
        .unwrap();

    fixture.assert_file_exists("keep.txt");
    fixture.assert_file_exists("draft.part");
    fixture.assert_file_exists("operations.log");
    fixture.assert_file_exists("Documents/move.txt");

    let names: Vec<String> = move_records(&fixture.log_lines())
        .into_iter()
        .map(|r| r.filename)
        .collect();
    assert_eq!(names, vec!["move.txt"]);
}

#[test]
fn test_excluded_directory_is_untouched() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg"]);
    let config = Config {
        filters: FilterRules {
            excluded_dirs: vec![fixture.path()],
            ..FilterRules::default()
        },
        ..Config::default()
    };

    let result = fixture
        .organizer_with(&config)
        .organize(&fixture.path(), ClassificationMode::Type)
        .unwrap();

    assert!(result.is_empty());
    fixture.assert_file_exists("a.jpg");
    assert!(fixture.log_lines().is_empty());
}

#[test]
fn test_log_living_in_organized_directory_is_protected() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg"]);
    fixture.create_subdir("logs");
    fs::write(fixture.path().join("logs").join("b.txt"), "b").unwrap();
    let log = Arc::new(OperationLog::new(
        fixture.path().join("logs").join("operations.log"),
    ));
    let organizer = FileOrganizer::builder(Arc::clone(&log)).build().unwrap();
    assert!(organizer.exclusions().is_excluded(log.path()));

    organizer
        .organize(&fixture.path(), ClassificationMode::Type)
        .unwrap();
    let inside = organizer
        .organize(&fixture.path().join("logs"), ClassificationMode::Type)
        .unwrap();

    assert!(inside.is_empty());
    fixture.assert_file_exists("Images/a.jpg");
    fixture.assert_file_exists("logs/b.txt");
    fixture.assert_file_exists("logs/operations.log");
    assert_eq!(log.read_all().unwrap().len(), 1);
}

#[test]
fn test_config_file_drives_organization() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.txt", ".hidden"]);
    let config_path = fixture.temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[organize]
catch_all = "Rest"

[organize.custom_categories]
Pictures = ["jpg"]

[filters]
enable_hidden_files = false
"#,
    )
    .unwrap();

    let config = Config::load(Some(&config_path)).unwrap();
    fixture
        .organizer_with(&config)
        .organize(&fixture.path(), ClassificationMode::Type)
        .unwrap();

    fixture.assert_file_exists("Pictures/a.jpg");
    fixture.assert_file_exists("Rest/b.txt");
    fixture.assert_file_exists(".hidden");
}

#[test]
fn test_move_by_type_into_external_folder() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.JPG", "b.png", "c.txt"]);
    let destination = fixture.temp_dir.path().join("pictures");

    let moved = fixture
        .organizer()
        .move_by_type(&fixture.path(), &destination, &["jpg", ".png"])
        .unwrap();

    assert_eq!(moved.len(), 2);
    assert!(destination.join("a.JPG").exists());
    assert!(destination.join("b.png").exists());
    fixture.assert_file_exists("c.txt");
}

// ============================================================================
// Test Suite 6: Backups
// ============================================================================

#[test]
fn test_backup_then_restore_merges_files_back() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg", "b.txt"]);

    let backup_dir = backup::create_backup(&fixture.path()).unwrap();
    fixture
        .organizer()
        .organize(&fixture.path(), ClassificationMode::Type)
        .unwrap();
    fixture.assert_file_not_exists("a.jpg");

    assert!(backup::revert_to_latest_backup(&fixture.path()).unwrap());

    fixture.assert_file_exists("a.jpg");
    fixture.assert_file_exists("b.txt");
    // Merge, not replace: organized copies stay.
    fixture.assert_file_exists("Images/a.jpg");
    assert!(backup_dir.join("a.jpg").exists());
}

#[test]
fn test_backup_folders_are_not_organized_as_files() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.jpg"]);
    backup::create_backup(&fixture.path()).unwrap();

    let result = fixture
        .organizer()
        .organize(&fixture.path(), ClassificationMode::Type)
        .unwrap();

    assert_eq!(result.total_moved(), 1);
    assert_eq!(backup::list_backups(&fixture.path()).unwrap().len(), 1);
}
