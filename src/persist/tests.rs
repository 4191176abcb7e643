use super::*;
use crate::buffer::{self, Resident, CACHE_SIZE};
use proptest::prelude::*;
use tempfile::{tempdir, TempDir};

fn write_numbered(dir: &TempDir, count: usize) -> PathBuf {
    let path = dir.path().join("doc.txt");
    let text: String = (0..count).map(|i| format!("line {}\n", i)).collect();
    fs::write(&path, text).unwrap();
    path
}

fn window_over(path: &Path, anchor: usize, count: usize) -> Resident {
    window_with_capacity(path, anchor, count, CACHE_SIZE)
}

fn window_with_capacity(path: &Path, anchor: usize, count: usize, capacity: usize) -> Resident {
    let (lines, _) = Document::new(path).unwrap().read_all().unwrap();
    let total = lines.len();
    let slice = lines[anchor..anchor + count].to_vec();
    Resident::new(Window::from_rows(anchor, slice, capacity), total)
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_save_overwrites_only_dirty_row() {
    let dir = tempdir().unwrap();
    let path = write_numbered(&dir, 250);
    let mut document = Document::new(&path).unwrap();
    let mut resident = window_over(&path, 50, 100);

    for (i, ch) in "edited ".chars().enumerate() {
        resident.window.insert_char(10, i, ch).unwrap();
    }
    let report = save(&mut resident, &mut document, &path, SaveOptions::default()).unwrap();

    assert_eq!(report.lines_written, 250);
    let lines = read_lines(&path);
    assert_eq!(lines.len(), 250);
    assert_eq!(lines[60], "edited line 60");
    for (i, line) in lines.iter().enumerate().filter(|(i, _)| *i != 60) {
        assert_eq!(line, &format!("line {}", i));
    }
    assert!(!resident.window.has_dirty());
    assert_eq!(resident.total_lines, 250);
}

#[test]
fn test_save_keeps_changes_made_outside_window() {
    let dir = tempdir().unwrap();
    let path = write_numbered(&dir, 20);
    let mut document = Document::new(&path).unwrap();
    let mut resident = window_over(&path, 0, 5);
    resident.window.insert_char(2, 0, '>').unwrap();

    // Someone else appends to the file after it was opened
    let mut text = fs::read_to_string(&path).unwrap();
    text.push_str("appended\n");
    fs::write(&path, text).unwrap();

    save(&mut resident, &mut document, &path, SaveOptions::default()).unwrap();
    let lines = read_lines(&path);
    assert_eq!(lines.len(), 21);
    assert_eq!(lines[2], ">line 2");
    assert_eq!(lines[20], "appended");
}

#[test]
fn test_split_does_not_clobber_following_rows() {
    let dir = tempdir().unwrap();
    let path = write_numbered(&dir, 10);
    let mut document = Document::new(&path).unwrap();
    let mut resident = window_over(&path, 3, 4);

    resident.split_line(1, 4).unwrap();
    assert_eq!(resident.total_lines, 11);
    save(&mut resident, &mut document, &path, SaveOptions::default()).unwrap();

    let lines = read_lines(&path);
    let expected: Vec<String> = [
        "line 0", "line 1", "line 2", "line 3", "line", " 4", "line 5", "line 6", "line 7",
        "line 8", "line 9",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    assert_eq!(lines, expected);
    assert_eq!(resident.total_lines, 11);
    assert_eq!(resident.window.extent(), 5);
}

#[test]
fn test_split_and_join_at_different_rows() {
    let dir = tempdir().unwrap();
    let path = write_numbered(&dir, 10);
    let mut document = Document::new(&path).unwrap();
    let mut resident = window_over(&path, 0, 10);

    resident.split_line(5, 4).unwrap();
    resident.join_with_previous(2).unwrap();
    // Same length as loaded, but rows 2..5 now sit one row higher
    assert_eq!(resident.window.len(), resident.window.extent());
    save(&mut resident, &mut document, &path, SaveOptions::default()).unwrap();

    assert_eq!(
        read_lines(&path),
        vec![
            "line 0",
            "line 1line 2",
            "line 3",
            "line 4",
            "line",
            " 5",
            "line 6",
            "line 7",
            "line 8",
            "line 9",
        ]
    );
}

#[test]
fn test_join_removes_exactly_one_row() {
    let dir = tempdir().unwrap();
    let path = write_numbered(&dir, 6);
    let mut document = Document::new(&path).unwrap();
    let mut resident = window_over(&path, 2, 3);

    resident.join_with_previous(1).unwrap();
    save(&mut resident, &mut document, &path, SaveOptions::default()).unwrap();

    assert_eq!(
        read_lines(&path),
        vec!["line 0", "line 1", "line 2line 3", "line 4", "line 5"]
    );
}

#[test]
fn test_new_file_is_created_on_save() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fresh.txt");
    let (mut document, mut resident) = buffer::open(&path, CACHE_SIZE).unwrap();

    resident.window.insert_char(0, 0, 'h').unwrap();
    resident.window.insert_char(0, 1, 'i').unwrap();
    let report = save(&mut resident, &mut document, &path, SaveOptions::default()).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "hi\n");
    assert_eq!(report.bytes_written, 3);
    assert!(!document.is_new());
}

#[test]
fn test_round_trip_is_byte_identical() {
    let dir = tempdir().unwrap();
    for text in ["a\nb\nc\n", "a\nb\nc", "x\r\ny\r\n", "", "\n\n"] {
        let path = dir.path().join("round.txt");
        fs::write(&path, text).unwrap();

        let (mut document, mut resident) = buffer::open(&path, CACHE_SIZE).unwrap();
        save(&mut resident, &mut document, &path, SaveOptions::default()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), text);
    }
}

#[test]
fn test_save_as_writes_elsewhere() {
    let dir = tempdir().unwrap();
    let path = write_numbered(&dir, 3);
    let copy = dir.path().join("copy.txt");
    let (mut document, mut resident) = buffer::open(&path, CACHE_SIZE).unwrap();

    resident.window.insert_char(0, 0, '*').unwrap();
    save(&mut resident, &mut document, &copy, SaveOptions::default()).unwrap();

    assert_eq!(read_lines(&copy), vec!["*line 0", "line 1", "line 2"]);
    assert_eq!(read_lines(&path), vec!["line 0", "line 1", "line 2"]);
    assert_eq!(document.path(), copy.as_path());
}

#[test]
fn test_backup_keeps_previous_contents() {
    let dir = tempdir().unwrap();
    let path = write_numbered(&dir, 2);
    let (mut document, mut resident) = buffer::open(&path, CACHE_SIZE).unwrap();

    resident.window.delete_char(1, 0).unwrap();
    save(&mut resident, &mut document, &path, SaveOptions { backup: true }).unwrap();

    assert_eq!(fs::read_to_string(backup_path(&path)).unwrap(), "line 0\nline 1\n");
    assert_eq!(fs::read_to_string(&path).unwrap(), "line 0\nine 1\n");
}

#[test]
fn test_failed_write_keeps_dirty_flags() {
    let dir = tempdir().unwrap();
    let path = write_numbered(&dir, 3);
    let (mut document, mut resident) = buffer::open(&path, CACHE_SIZE).unwrap();
    resident.window.insert_char(1, 0, '!').unwrap();

    let unreachable = dir.path().join("missing-dir").join("out.txt");
    let result = save(&mut resident, &mut document, &unreachable, SaveOptions::default());

    assert!(matches!(result, Err(CoreError::SaveFailed(_))));
    assert!(resident.window.is_dirty(1));
    assert_eq!(document.path(), path.as_path());
}

#[test]
fn test_failed_reread_keeps_dirty_flags() {
    let dir = tempdir().unwrap();
    let path = write_numbered(&dir, 3);
    let (mut document, mut resident) = buffer::open(&path, CACHE_SIZE).unwrap();
    resident.window.insert_char(0, 0, '!').unwrap();

    fs::remove_file(&path).unwrap();
    fs::create_dir(&path).unwrap();

    let result = save(&mut resident, &mut document, &path, SaveOptions::default());
    assert!(matches!(result, Err(CoreError::SaveFailed(_))));
    assert!(resident.window.is_dirty(0));
}

#[test]
fn test_merge_grows_past_end() {
    let mut all_lines = vec!["a".to_string()];
    let mut window = Window::from_rows(0, vec!["a".into(), "b".into()], CACHE_SIZE);
    window.insert_char(1, 1, '!').unwrap();

    merge(&mut all_lines, &window);
    assert_eq!(all_lines, vec!["a", "b!"]);
}

#[test]
fn test_backup_path() {
    assert_eq!(backup_path(Path::new("/tmp/x.txt")), PathBuf::from("/tmp/x.txt~"));
}

fn edit_case() -> impl Strategy<Value = (usize, usize, usize, Vec<(usize, String)>)> {
    (1..60usize).prop_flat_map(|total| {
        (0..total).prop_flat_map(move |anchor| {
            (1..=(total - anchor)).prop_flat_map(move |count| {
                let edits = proptest::collection::vec((0..count, "[a-z]{1,4}"), 0..8);
                (Just(total), Just(anchor), Just(count), edits)
            })
        })
    })
}

#[derive(Debug, Clone)]
enum Edit {
    Type(usize, String),
    Split(usize, usize),
    Join(usize),
}

fn structural_case() -> impl Strategy<Value = (usize, usize, usize, Vec<Edit>)> {
    (1..40usize).prop_flat_map(|total| {
        (0..total).prop_flat_map(move |anchor| {
            (1..=(total - anchor)).prop_flat_map(move |count| {
                let edit = prop_oneof![
                    (0..64usize, "[a-z]{1,3}").prop_map(|(r, t)| Edit::Type(r, t)),
                    (0..64usize, 0..10usize).prop_map(|(r, c)| Edit::Split(r, c)),
                    (0..64usize).prop_map(Edit::Join),
                ];
                let edits = proptest::collection::vec(edit, 0..12);
                (Just(total), Just(anchor), Just(count), edits)
            })
        })
    })
}

/// Apply one edit at a row and column folded into the current window.
/// Edits the window cannot take (a full window, joining row 0) are skipped.
fn apply_edit(resident: &mut Resident, edit: &Edit) {
    let len = resident.window.len();
    match edit {
        Edit::Type(row, text) => {
            let row = row % len;
            let col = resident.window.line_len(row).unwrap();
            for (i, ch) in text.chars().enumerate() {
                resident.window.insert_char(row, col + i, ch).unwrap();
            }
        }
        Edit::Split(row, col) => {
            let row = row % len;
            let col = (*col).min(resident.window.line_len(row).unwrap());
            let _ = resident.split_line(row, col);
        }
        Edit::Join(row) => {
            let _ = resident.join_with_previous(row % len);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_save_writes_window_between_untouched_rows(
        (total, anchor, count, edits) in structural_case()
    ) {
        let dir = tempdir().unwrap();
        let path = write_numbered(&dir, total);
        let before = read_lines(&path);
        let mut document = Document::new(&path).unwrap();
        // A little headroom so some splits fit and others hit the bound
        let mut resident = window_with_capacity(&path, anchor, count, count + 2);

        for edit in &edits {
            apply_edit(&mut resident, edit);
            prop_assert!(resident.window.len() <= resident.window.capacity());
        }

        let extent = resident.window.extent();
        let mut expected = before[..anchor].to_vec();
        expected.extend(resident.window.lines().iter().cloned());
        expected.extend(before[anchor + extent..].iter().cloned());

        save(&mut resident, &mut document, &path, SaveOptions::default()).unwrap();
        let first = fs::read(&path).unwrap();
        prop_assert_eq!(read_lines(&path), expected.clone());
        prop_assert_eq!(resident.total_lines, expected.len());
        prop_assert!(!resident.window.has_dirty());
        prop_assert!(resident.window.is_aligned());

        save(&mut resident, &mut document, &path, SaveOptions::default()).unwrap();
        prop_assert_eq!(fs::read(&path).unwrap(), first);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_save_preserves_rows_outside_window((total, anchor, count, edits) in edit_case()) {
        let dir = tempdir().unwrap();
        let path = write_numbered(&dir, total);
        let before = read_lines(&path);
        let mut document = Document::new(&path).unwrap();
        let mut resident = window_over(&path, anchor, count);

        for (row, text) in &edits {
            for (i, ch) in text.chars().enumerate() {
                resident.window.insert_char(*row, i, ch).unwrap();
            }
        }
        let dirty_before: Vec<(usize, String)> = (0..resident.window.len())
            .filter(|&i| resident.window.is_dirty(i))
            .map(|i| (i, resident.window.line_at(i).unwrap().to_string()))
            .collect();

        save(&mut resident, &mut document, &path, SaveOptions::default()).unwrap();
        let first = fs::read(&path).unwrap();
        let after = read_lines(&path);

        prop_assert_eq!(after.len(), before.len());
        for row in (0..total).filter(|r| *r < anchor || *r >= anchor + count) {
            prop_assert_eq!(&after[row], &before[row]);
        }
        for (i, line) in &dirty_before {
            prop_assert_eq!(&after[anchor + i], line);
        }
        prop_assert!(!resident.window.has_dirty());

        // A second save with no edits in between changes nothing
        save(&mut resident, &mut document, &path, SaveOptions::default()).unwrap();
        prop_assert_eq!(fs::read(&path).unwrap(), first);
    }
}
