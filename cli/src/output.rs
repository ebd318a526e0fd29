#[derive(Clone, Copy, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Indented tree followed by the bundle summary
    Text,
    /// JSON document of the forest and the summary
    Json,
}
