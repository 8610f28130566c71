use std::fmt;

use serde::{Deserialize, Serialize};

/// Source language a rule is written for.
///
/// The set of languages with at least one active rule decides which file
/// extensions an analysis pass considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
	Apex,
	Ecmascript,
	Html,
	Java,
	Jsp,
	Kotlin,
	Modelica,
	Plsql,
	Scala,
	Swift,
	Velocity,
	Visualforce,
	Xml,
}

impl Language {
	/// Every known language, in declaration order.
	pub const ALL: [Language; 13] = [
		Self::Apex,
		Self::Ecmascript,
		Self::Html,
		Self::Java,
		Self::Jsp,
		Self::Kotlin,
		Self::Modelica,
		Self::Plsql,
		Self::Scala,
		Self::Swift,
		Self::Velocity,
		Self::Visualforce,
		Self::Xml,
	];

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Apex => "apex",
			Self::Ecmascript => "ecmascript",
			Self::Html => "html",
			Self::Java => "java",
			Self::Jsp => "jsp",
			Self::Kotlin => "kotlin",
			Self::Modelica => "modelica",
			Self::Plsql => "plsql",
			Self::Scala => "scala",
			Self::Swift => "swift",
			Self::Velocity => "velocity",
			Self::Visualforce => "visualforce",
			Self::Xml => "xml",
		}
	}

	/// Lowercase file extensions (without the dot) owned by this language.
	pub const fn extensions(self) -> &'static [&'static str] {
		match self {
			Self::Apex => &["cls", "trigger"],
			Self::Ecmascript => &["js"],
			Self::Html => &["html", "htm", "xhtml", "xht", "shtml"],
			Self::Java => &["java"],
			Self::Jsp => &["jsp", "jspx", "jspf", "tag"],
			Self::Kotlin => &["kt", "ktm"],
			Self::Modelica => &["mo"],
			Self::Plsql => &["sql", "trg", "prc", "fnc", "pld", "pls", "plh", "plb", "pck", "pks", "pkh", "pkb", "typ", "tyb", "tps", "tpb"],
			Self::Scala => &["scala"],
			Self::Swift => &["swift"],
			Self::Velocity => &["vm"],
			Self::Visualforce => &["page", "component"],
			Self::Xml => &["xml", "xsl", "xslt", "wsdl", "pom"],
		}
	}
}

impl fmt::Display for Language {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn extensions_are_lowercase_and_dotless() {
		for language in Language::ALL {
			for ext in language.extensions() {
				assert_eq!(*ext, ext.to_ascii_lowercase(), "{language}");
				assert!(!ext.starts_with('.'), "{language}");
			}
		}
	}

	#[test]
	fn deserializes_lowercase_names() {
		#[derive(Deserialize)]
		struct Wrapper {
			language: Language,
		}
		let parsed: Wrapper = serde_json::from_str(r#"{"language":"ecmascript"}"#).unwrap();
		assert_eq!(parsed.language, Language::Ecmascript);
	}
}
