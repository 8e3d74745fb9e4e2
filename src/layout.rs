use std::path::PathBuf;

/// Paths of everything the site builder reads or writes under the output directory.
#[derive(Debug, Clone)]
pub struct SiteLayout {
    root: PathBuf,
}

impl SiteLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join("manifest.json")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir().join("papers.json")
    }

    pub fn archives_dir(&self) -> PathBuf {
        self.root.join("archives")
    }

    pub fn archive_listing_path(&self) -> PathBuf {
        self.archives_dir().join("index.html")
    }

    pub fn batch_dir(&self, batch_id: &str) -> PathBuf {
        self.archives_dir().join(batch_id)
    }

    pub fn batch_json_path(&self, batch_id: &str) -> PathBuf {
        self.batch_dir(batch_id).join("batch.json")
    }

    pub fn batch_index_path(&self, batch_id: &str) -> PathBuf {
        self.batch_dir(batch_id).join("index.html")
    }

    pub fn topics_dir(&self) -> PathBuf {
        self.root.join("topics")
    }

    pub fn paper_page_path(&self, topic: &str, paper_id: &str) -> PathBuf {
        self.topics_dir()
            .join(topic_slug(topic))
            .join(paper_file_name(paper_id))
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join("index.html")
    }
}

/// Link to a paper page, relative to the site root.
pub fn paper_href(topic: &str, paper_id: &str) -> String {
    format!("topics/{}/{}", topic_slug(topic), paper_file_name(paper_id))
}

/// Directory-safe topic name: lowercase `[a-z0-9_]`, runs of other chars collapsed to `_`.
pub fn topic_slug(topic: &str) -> String {
    let mut slug = String::with_capacity(topic.len());
    for c in topic.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() || c == '_' {
            slug.push(c);
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "general".to_owned()
    } else {
        slug.to_owned()
    }
}

/// `<id>.html` with every byte outside `[A-Za-z0-9.-]` written as `_XX`, so distinct ids
/// never share a file.
fn paper_file_name(paper_id: &str) -> String {
    let mut stem = String::with_capacity(paper_id.len());
    for byte in paper_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'.' || byte == b'-' {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("_{byte:02X}"));
        }
    }
    format!("{stem}.html")
}
