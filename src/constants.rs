pub const SUPABASE_URL_ENV_NAME: &str = "SUPABASE_URL";
pub const SUPABASE_KEY_ENV_NAME: &str = "SUPABASE_KEY";

pub const RECORDS_TABLE: &str = "html_files";

pub const HTML_MIME: &str = "text/html";
pub const UPLOAD_FIELD: &str = "file";
pub const IMPROVE_ROUTE: &str = "/improve-code/";

pub const DEFAULT_MODEL_PROGRAM: &str = "ollama";
pub const DEFAULT_MODEL: &str = "codellama";

pub(crate) const THINK_STRIPPER: &str = r"<think>[\s\S]*</think>\s*";

pub(crate) const DEFAULT_PROMPT_TEMPLATE: &str = "Improve the aesthetics, colour palette and responsiveness of the following HTML Code and give me the new code.\n\n{html}";
