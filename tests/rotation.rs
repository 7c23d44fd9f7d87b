// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use logtee::Adapter;
use logtee::Value;
use logtee::sink::Capture;
use tempfile::TempDir;

fn entries(dir: &Path) -> Vec<String> {
    let mut names = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    names.sort();
    names
}

fn fill_one_megabyte(compress: bool) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let mut adapter = Adapter::new(temp_dir.path().join("t.log"), "info");
    adapter
        .set_color(false)
        .set_console(Capture::default())
        .set_max_file_size(1)
        .set_compress(compress);
    let logger = adapter.build().unwrap();

    let payload = "x".repeat(200);
    for i in 0..6000 {
        logger.infow(
            "filling",
            &[("seq", Value::from(i)), ("payload", Value::from(&payload))],
        );
    }
    // waits for the background compression
    drop(logger);
    temp_dir
}

#[test]
fn test_rotates_past_max_file_size() {
    let temp_dir = fill_one_megabyte(false);

    let names = entries(temp_dir.path());
    assert_eq!(names.len(), 2, "{names:?}");
    assert_eq!(names[1], "t.log");
    assert!(names[0].starts_with("t-"), "{names:?}");
    assert!(names[0].ends_with(".log"), "{names:?}");

    let backup = fs::metadata(temp_dir.path().join(&names[0])).unwrap();
    assert!(backup.len() <= 1024 * 1024);
    assert!(backup.len() > 1024 * 1024 - 512);

    // no record is split across files
    let active = fs::read_to_string(temp_dir.path().join("t.log")).unwrap();
    assert!(active.ends_with("\"}\n"));
    assert!(active.lines().all(|line| line.contains("\tINFO\tfilling\t{\"seq\": ")));
}

#[test]
fn test_rotated_backup_is_compressed() {
    let temp_dir = fill_one_megabyte(true);

    let names = entries(temp_dir.path());
    assert_eq!(names.len(), 2, "{names:?}");
    assert!(names[0].ends_with(".log.gz"), "{names:?}");

    let mut content = String::new();
    GzDecoder::new(fs::File::open(temp_dir.path().join(&names[0])).unwrap())
        .read_to_string(&mut content)
        .unwrap();
    assert!(content.starts_with(|c: char| c.is_ascii_digit()));
    assert!(content.lines().next().unwrap().contains("{\"seq\": 0, "));
}

#[test]
fn test_appends_across_builds() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("t.log");

    for round in 0..2 {
        let mut adapter = Adapter::new(&path, "info");
        adapter.set_color(false).set_console(Capture::default());
        let logger = adapter.build().unwrap();
        logger.infof(format_args!("round {round}"));
    }

    let content = fs::read_to_string(&path).unwrap();
    let lines = content.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("\tround 0"));
    assert!(lines[1].ends_with("\tround 1"));
    assert_eq!(entries(temp_dir.path()), ["t.log"]);
}
