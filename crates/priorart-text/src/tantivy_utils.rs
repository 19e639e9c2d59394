use anyhow::Result;
use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::{LowerCaser, TextAnalyzer, TokenStream, WhitespaceTokenizer};
use tantivy::Index;

/// Whitespace splitting plus lower-casing; punctuation stays attached to its word.
pub const LEXICAL_TOKENIZER: &str = "whitespace_lower";

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	let _id_field = schema_builder.add_text_field("id", STRING | STORED);
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(LEXICAL_TOKENIZER).set_index_option(IndexRecordOption::WithFreqs);
	let text_options = TextOptions::default().set_indexing_options(text_field_indexing);
	let _text_field = schema_builder.add_text_field("text", text_options);
	schema_builder.build()
}

pub fn register_tokenizer(index: &Index) {
	let tokenizer = TextAnalyzer::builder(WhitespaceTokenizer::default())
		.filter(LowerCaser)
		.build();
	index.tokenizers().register(LEXICAL_TOKENIZER, tokenizer);
}

/// Run `text` through the analyzer registered for `field`, the same one used at
/// index time, so query terms line up with indexed terms.
pub fn analyze(index: &Index, field: Field, text: &str) -> Result<Vec<String>> {
	let mut analyzer = index.tokenizer_for_field(field)?;
	let mut stream = analyzer.token_stream(text);
	let mut terms = Vec::new();
	while stream.advance() { terms.push(stream.token().text.clone()); }
	Ok(terms)
}
