use serde::Deserialize;

/// Cursor pagination query parameters shared by listing endpoints.
/// `after` is the last document id of the previous page, passed verbatim.
#[derive(Debug, Clone, Deserialize)]
pub struct CursorQuery {
	pub after: Option<String>,
	pub limit: Option<usize>,
}
