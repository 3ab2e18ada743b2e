use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use dlg_api::parse_localization_json;
use walkdir::WalkDir;

use crate::{DlgToolError, TestCase, TESTCASE_SCHEMA_V1};

pub const STORY_FILE: &str = "story.json";
pub const LOCALIZATION_FILE: &str = "localization.json";
pub const TESTCASE_FILE: &str = "testcase.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorySource {
    pub story_json: String,
    pub localization: Option<BTreeMap<String, String>>,
}

pub fn read_story_from_dir(story_dir: &Path) -> Result<StorySource, DlgToolError> {
    let story_path = story_dir.join(STORY_FILE);
    if !story_path.is_file() {
        return Err(DlgToolError::StoryMissing {
            path: story_dir.to_path_buf(),
        });
    }
    let story_json = read_file(&story_path)?;

    let localization_path = story_dir.join(LOCALIZATION_FILE);
    let localization = if localization_path.is_file() {
        Some(parse_localization_json(&read_file(&localization_path)?)?)
    } else {
        None
    };

    Ok(StorySource {
        story_json,
        localization,
    })
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, DlgToolError> {
    let raw = read_file(case_path)?;
    let parsed: TestCase =
        serde_json::from_str(&raw).map_err(|source| DlgToolError::ParseCase {
            path: case_path.to_path_buf(),
            source,
        })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(DlgToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}

/// Story directories under `root` that carry a testcase, in file-name order.
pub fn discover_cases(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == TESTCASE_FILE)
        .filter_map(|entry| entry.path().parent().map(Path::to_path_buf))
        .collect()
}

fn read_file(path: &Path) -> Result<String, DlgToolError> {
    fs::read_to_string(path).map_err(|source| DlgToolError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}
