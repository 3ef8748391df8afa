//! Example records and schema text

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Literal header placed once in front of every collected schema
pub const SCHEMA_HEADER: &str = "\nSchema:";

/// Literal prefix of the formatted question
pub const QUESTION_PREFIX: &str = "Question: ";

/// Identifies one embedded database instance
///
/// Corresponds 1:1 with a directory under the database root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseId(String);

impl DatabaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DatabaseId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// `CREATE TABLE` statements collected for a single database
///
/// Statements keep their discovery order: file order first, then match
/// order within a file. An empty value still renders the header, which is
/// distinct from a database with no schema source at all (`None` upstream).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaText {
    statements: Vec<String>,
}

impl SchemaText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one statement
    pub fn push(&mut self, statement: impl Into<String>) {
        self.statements.push(statement.into());
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Render as the header followed by each statement on its own line
    pub fn render(&self) -> String {
        let capacity = SCHEMA_HEADER.len()
            + self.statements.iter().map(|s| s.len() + 1).sum::<usize>();
        let mut text = String::with_capacity(capacity);
        text.push_str(SCHEMA_HEADER);
        for statement in &self.statements {
            text.push('\n');
            text.push_str(statement);
        }
        text
    }
}

impl fmt::Display for SchemaText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Question/query pair as found in a raw dataset split
///
/// Unknown fields (tokenizations, parsed SQL trees) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawExample {
    pub question: String,

    pub db_id: DatabaseId,

    /// Gold query, empty when the split carries none or `null`
    #[serde(default, deserialize_with = "null_as_empty")]
    pub query: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Uniform training/evaluation record
///
/// `input` is always `question` immediately followed by `schema`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedExample {
    #[serde(rename = "Question")]
    pub question: String,

    #[serde(rename = "Schema")]
    pub schema: String,

    #[serde(rename = "Input")]
    pub input: String,

    pub query: String,

    pub db_id: DatabaseId,
}

impl FormattedExample {
    /// Join a raw example with the schema collected for its database
    pub fn new(raw: &RawExample, schema: &SchemaText) -> Self {
        let question = format!("{}{}", QUESTION_PREFIX, raw.question);
        let schema = schema.render();
        let input = format!("{}{}", question, schema);

        Self {
            question,
            schema,
            input,
            query: raw.query.clone(),
            db_id: raw.db_id.clone(),
        }
    }
}

/// Ordered collection of formatted examples, persisted as a JSON array
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Corpus {
    examples: Vec<FormattedExample>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, example: FormattedExample) {
        self.examples.push(example);
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn examples(&self) -> &[FormattedExample] {
        &self.examples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FormattedExample> {
        self.examples.iter()
    }

    /// Serialize with the stable 4-space indentation used for every corpus file
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        to_indented_json(self)
    }

    /// Parse a corpus file's content
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<Vec<FormattedExample>> for Corpus {
    fn from(examples: Vec<FormattedExample>) -> Self {
        Self { examples }
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a FormattedExample;
    type IntoIter = std::slice::Iter<'a, FormattedExample>;

    fn into_iter(self) -> Self::IntoIter {
        self.examples.iter()
    }
}

/// Pretty-print any value with 4-space indentation
pub fn to_indented_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;

    // serde_json only ever emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw(question: &str, db_id: &str, query: &str) -> RawExample {
        RawExample {
            question: question.to_string(),
            db_id: DatabaseId::new(db_id),
            query: query.to_string(),
        }
    }

    #[test]
    fn absent_or_null_query_is_empty() {
        let raw: Vec<RawExample> = serde_json::from_str(
            r#"[
                {"question": "q1", "db_id": "d"},
                {"question": "q2", "db_id": "d", "query": null},
                {"question": "q3", "db_id": "d", "query": "SELECT 1"}
            ]"#,
        )
        .unwrap();

        let queries: Vec<&str> = raw.iter().map(|r| r.query.as_str()).collect();
        assert_eq!(queries, vec!["", "", "SELECT 1"]);
    }

    #[test]
    fn empty_schema_renders_header_only() {
        let schema = SchemaText::new();
        assert!(schema.is_empty());
        assert_eq!(schema.render(), "\nSchema:");
    }

    #[test]
    fn schema_statements_each_on_own_line() {
        let mut schema = SchemaText::new();
        schema.push("CREATE TABLE t (a INT);");
        schema.push("CREATE TABLE u (b TEXT);");

        assert_eq!(
            schema.to_string(),
            "\nSchema:\nCREATE TABLE t (a INT);\nCREATE TABLE u (b TEXT);"
        );
    }

    #[test]
    fn input_is_question_then_schema() {
        let mut schema = SchemaText::new();
        schema.push("CREATE TABLE singer (id INT);");

        let example = FormattedExample::new(&raw("How many singers?", "concert", "SELECT 1"), &schema);

        assert_eq!(example.question, "Question: How many singers?");
        assert_eq!(example.input, format!("{}{}", example.question, example.schema));
        assert_eq!(
            example.input,
            "Question: How many singers?\nSchema:\nCREATE TABLE singer (id INT);"
        );
        assert_eq!(example.db_id.as_str(), "concert");
    }

    #[test]
    fn raw_example_missing_query_defaults_empty() {
        let parsed: RawExample =
            serde_json::from_str(r#"{"question": "q", "db_id": "d", "query_toks": []}"#).unwrap();
        assert_eq!(parsed.query, "");
        assert_eq!(parsed.db_id, DatabaseId::from("d"));
    }

    #[test]
    fn formatted_example_uses_corpus_field_names() {
        let example = FormattedExample::new(&raw("q", "d", "SELECT 1"), &SchemaText::new());
        let value = serde_json::to_value(&example).unwrap();

        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        for key in ["Question", "Schema", "Input", "query", "db_id"] {
            assert!(keys.contains(&key), "missing key {}", key);
        }
        assert_eq!(keys.len(), 5);
    }

    #[test]
    fn corpus_json_uses_four_space_indent() {
        let mut corpus = Corpus::new();
        corpus.push(FormattedExample::new(&raw("q", "d", ""), &SchemaText::new()));

        let json = corpus.to_json().unwrap();
        assert!(json.starts_with("[\n    {\n        \"Question\""));

        let parsed = Corpus::from_json(&json).unwrap();
        assert_eq!(parsed, corpus);
    }
}
