use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug)]
pub enum BatchMsg {
    // Discovery
    Started { input_dir: PathBuf, total: usize },
    NoInput(PathBuf),

    // Per file
    FileStarted(String),
    FileFixed { name: String, elapsed: Duration },
    FileFailed { name: String, error: String },
    Progress(usize, usize),

    // Batch end
    Completed { fixed: usize, failed: usize },
    Failed(String),
}
