use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::FileClass;

/// Named extension lists used to short-circuit byte inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtensionPreset {
    #[default]
    Simple,
    /// The common lists plus Unity-specific entries: C# and shader sources
    /// as text, `.psd`, `.exr`, `.blend`, native plugins and packages as
    /// binary. Verdicts for those extensions differ from `Simple`.
    UnityProject,
}

impl ExtensionPreset {
    pub const fn as_str(self) -> &'static str {
        match self {
            ExtensionPreset::Simple => "simple",
            ExtensionPreset::UnityProject => "unity-project",
        }
    }

    pub fn extensions(self) -> ExtensionSets {
        match self {
            ExtensionPreset::Simple => ExtensionSets::new(COMMON_TEXT, COMMON_BINARY),
            ExtensionPreset::UnityProject => {
                let mut sets = ExtensionSets::new(COMMON_TEXT, COMMON_BINARY);
                sets.extend(UNITY_TEXT, UNITY_BINARY);
                sets
            }
        }
    }
}

/// Case-insensitive text and binary extension sets. Entries carry the leading
/// dot, e.g. `.png`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionSets {
    text: HashSet<String>,
    binary: HashSet<String>,
}

impl ExtensionSets {
    pub fn new(text: &[&str], binary: &[&str]) -> Self {
        let mut sets = Self::default();
        sets.extend(text, binary);
        sets
    }

    fn extend(&mut self, text: &[&str], binary: &[&str]) {
        self.text.extend(text.iter().map(|ext| ext.to_ascii_lowercase()));
        self.binary
            .extend(binary.iter().map(|ext| ext.to_ascii_lowercase()));
    }

    /// Verdict from the extension alone, text list first.
    pub fn lookup(&self, path: &Path) -> Option<FileClass> {
        let name = path.file_name()?.to_string_lossy();
        let extension = extension_of(&name)?.to_ascii_lowercase();
        if self.text.contains(&extension) {
            Some(FileClass::Text)
        } else if self.binary.contains(&extension) {
            Some(FileClass::Binary)
        } else {
            None
        }
    }
}

fn extension_of(name: &str) -> Option<&str> {
    let index = name.rfind('.')?;
    let extension = &name[index..];
    (extension.len() > 1).then_some(extension)
}

const COMMON_TEXT: &[&str] = &[
    ".txt",
    ".c",
    ".config",
    ".h",
    ".hpp",
    ".cpp",
    ".csproj",
    ".sln",
    ".bat",
    ".xsd",
    ".md",
    ".json",
    ".xml",
    ".gitignore",
    ".gitattributes",
    ".gitkeep",
];

const COMMON_BINARY: &[&str] = &[
    ".exe",
    // often text, but not reliably
    ".asset",
    ".assets",
    ".com",
    ".dll",
    ".pdb",
    ".lib",
    ".zip",
    ".7z",
    ".rar",
    ".nupkg",
    ".png",
    ".gif",
    ".tif",
    ".tga",
    ".ttf",
    ".tiff",
    ".bmp",
    ".ico",
    ".jpg",
    ".jpeg",
    ".dds",
    ".wav",
    ".mp3",
    ".mp4",
    ".mpg",
    ".mpeg",
    ".wmv",
    ".avi",
    ".ogg",
    ".fbx",
    ".bytes",
    ".xls",
    ".doc",
];

const UNITY_TEXT: &[&str] = &[
    ".cs",
    ".shader",
    ".cginc",
    ".hlsl",
    ".asmdef",
    ".uss",
    ".uxml",
];

const UNITY_BINARY: &[&str] = &[
    ".unitypackage",
    ".psd",
    ".exr",
    ".hdr",
    ".otf",
    ".blend",
    ".so",
    ".aar",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let sets = ExtensionPreset::Simple.extensions();
        assert_eq!(sets.lookup(Path::new("a/B.PNG")), Some(FileClass::Binary));
        assert_eq!(sets.lookup(Path::new("README.Md")), Some(FileClass::Text));
        assert_eq!(sets.lookup(Path::new("Makefile")), None);
        assert_eq!(sets.lookup(Path::new("script.rs")), None);
    }

    #[test]
    fn dot_files_are_looked_up_by_full_name() {
        let sets = ExtensionPreset::Simple.extensions();
        assert_eq!(sets.lookup(Path::new(".gitignore")), Some(FileClass::Text));
    }

    #[test]
    fn unity_preset_extends_the_common_lists() {
        let simple = ExtensionPreset::Simple.extensions();
        let unity = ExtensionPreset::UnityProject.extensions();
        assert_eq!(simple.lookup(Path::new("Player.cs")), None);
        assert_eq!(unity.lookup(Path::new("Player.cs")), Some(FileClass::Text));
        assert_eq!(unity.lookup(Path::new("art.psd")), Some(FileClass::Binary));
        assert_eq!(unity.lookup(Path::new("tex.png")), Some(FileClass::Binary));
    }
}
