use super::{
    CompiledQuery, ImportBinding, Language, Library, PatternCompiler, escape_literal,
    match_condition, stacked_conditions,
};
use crate::error::PatternCompileError;
use crate::query::QueryHit;

pub struct PythonCompiler;

impl PythonCompiler {
    fn call_with_keyword(
        callee: &str,
        callee_capture: &str,
        callee_expr: &str,
        keyword: &str,
        value: Option<&str>,
    ) -> Result<CompiledQuery, PatternCompileError> {
        let callee_cond = match_condition(callee_capture, callee_expr)?;
        let keyword_cond = match_condition("kwarg_name", keyword)?;
        let (value_part, captures): (String, Vec<&str>) = match value {
            Some(v) => (
                format!(
                    "value: (_) @kwarg_value\n          {}",
                    match_condition("kwarg_value", v)?
                ),
                vec![callee_capture, "kwarg_name", "kwarg_value"],
            ),
            None => (String::new(), vec![callee_capture, "kwarg_name"]),
        };
        let callee = callee.replace("{cond}", &callee_cond);
        Ok(CompiledQuery::new(
            format!(
                "(call
  function: {callee}
  arguments: (argument_list
    (keyword_argument
      name: (identifier) @kwarg_name
      {keyword_cond}
      {value_part})))"
            ),
            &captures,
        ))
    }
}

const FUNCTION_CALLEE: &str = "(identifier) @function_name
  {cond}";

const METHOD_CALLEE: &str = "(attribute
    attribute: (identifier) @method_name
    {cond})";

impl PatternCompiler for PythonCompiler {
    fn language(&self) -> Language {
        Language::Python
    }

    fn ts_language(&self) -> tree_sitter::Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn function_call(&self, name: &str) -> Result<CompiledQuery, PatternCompileError> {
        let cond = match_condition("function_name", name)?;
        Ok(CompiledQuery::new(
            format!(
                "(call
  function: (identifier) @function_name
  {cond})"
            ),
            &["function_name"],
        ))
    }

    fn method_call(&self, name: &str) -> Result<CompiledQuery, PatternCompileError> {
        let cond = match_condition("method_name", name)?;
        Ok(CompiledQuery::new(
            format!(
                "(call
  function: (attribute
    attribute: (identifier) @method_name
    {cond}))"
            ),
            &["method_name"],
        ))
    }

    fn property_access(&self, name: &str) -> Result<CompiledQuery, PatternCompileError> {
        let cond = match_condition("property_name", name)?;
        Ok(CompiledQuery::new(
            format!(
                "(attribute
  attribute: (identifier) @property_name
  {cond})"
            ),
            &["property_name"],
        ))
    }

    fn type_reference(&self, conditions: &[&str]) -> Result<CompiledQuery, PatternCompileError> {
        let (captures, conds, names) = stacked_conditions("type_name", conditions)?;
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        Ok(CompiledQuery::new(
            format!(
                "((type) {captures}
  {conds})"
            ),
            &names,
        ))
    }

    fn import(&self, name: &str) -> Result<CompiledQuery, PatternCompileError> {
        let cond = match_condition("name", name)?;
        Ok(CompiledQuery::new(
            format!(
                "(import_statement
  name: (dotted_name) @name
  {cond})"
            ),
            &["name"],
        ))
    }

    fn import_from_module(&self, module: &str) -> Result<CompiledQuery, PatternCompileError> {
        let cond = match_condition("module_name", module)?;
        Ok(CompiledQuery::new(
            format!(
                "(import_from_statement
  module_name: (dotted_name) @module_name
  {cond})"
            ),
            &["module_name"],
        ))
    }

    fn import_from_name(
        &self,
        module: &str,
        name: &str,
    ) -> Result<CompiledQuery, PatternCompileError> {
        let module_cond = match_condition("module_name", module)?;
        let name_cond = match_condition("name", name)?;
        Ok(CompiledQuery::new(
            format!(
                "(import_from_statement
  module_name: (dotted_name) @module_name
  {module_cond}
  name: (dotted_name) @name
  {name_cond})"
            ),
            &["module_name", "name"],
        ))
    }

    fn function_call_with_argument(
        &self,
        function: &str,
        argument: &str,
    ) -> Result<CompiledQuery, PatternCompileError> {
        let function_cond = match_condition("function", function)?;
        let args_cond = match_condition("args", argument)?;
        Ok(CompiledQuery::new(
            format!(
                "(call
  function: [
    (identifier) @function
    (attribute) @function
  ]
  arguments: (argument_list) @args
  {function_cond}
  {args_cond})"
            ),
            &["function", "args"],
        ))
    }

    fn method_call_with_keyword_argument(
        &self,
        method: &str,
        keyword: &str,
    ) -> Result<CompiledQuery, PatternCompileError> {
        Self::call_with_keyword(METHOD_CALLEE, "method_name", method, keyword, None)
    }

    fn function_call_with_keyword_argument(
        &self,
        function: &str,
        keyword: &str,
    ) -> Result<CompiledQuery, PatternCompileError> {
        Self::call_with_keyword(FUNCTION_CALLEE, "function_name", function, keyword, None)
    }

    fn method_call_with_keyword_argument_value(
        &self,
        method: &str,
        keyword: &str,
        value: &str,
    ) -> Result<CompiledQuery, PatternCompileError> {
        Self::call_with_keyword(METHOD_CALLEE, "method_name", method, keyword, Some(value))
    }

    fn function_call_with_keyword_argument_value(
        &self,
        function: &str,
        keyword: &str,
        value: &str,
    ) -> Result<CompiledQuery, PatternCompileError> {
        Self::call_with_keyword(FUNCTION_CALLEE, "function_name", function, keyword, Some(value))
    }

    fn namespace_import_query(&self, library: &Library) -> String {
        let regex = escape_literal(&library.import_regex);
        format!(
            "(import_statement
  name: (aliased_import
    name: (dotted_name) @canonical
    (#match? @canonical \"{regex}\")
    alias: (identifier) @alias))"
        )
    }

    fn extract_alias(&self, hit: &QueryHit, _library: &Library) -> Option<ImportBinding> {
        let canonical = hit.get("canonical")?.text.clone();
        let alias = hit.get("alias")?.text.clone();
        Some(ImportBinding { canonical, alias })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::extract_captures;
    use crate::parse::parse_tree;
    use crate::query;

    fn spans(compiled: &CompiledQuery, src: &str, dedup: bool) -> Vec<(usize, usize, usize)> {
        let lang = PythonCompiler.ts_language();
        let tree = parse_tree(&lang, src).unwrap();
        let hits = query::run(&lang, &compiled.source, &tree, src.as_bytes()).unwrap();
        extract_captures(&hits, &compiled.captures, dedup)
            .into_iter()
            .map(|c| (c.start.row, c.start.column, c.end.column))
            .collect()
    }

    #[test]
    fn function_call() {
        let q = PythonCompiler.function_call("^basic_auth$").unwrap();
        let src = "auth = basic_auth('u', 'p')\nother_auth()\n";
        assert_eq!(spans(&q, src, false), vec![(0, 7, 17)]);
    }

    #[test]
    fn method_call_not_plain_attribute() {
        let q = PythonCompiler.method_call("^read_transaction$").unwrap();
        let src = "session.read_transaction(work)\nf = session.read_transaction\n";
        assert_eq!(spans(&q, src, false), vec![(0, 8, 24)]);
    }

    #[test]
    fn property_access_includes_calls() {
        let q = PythonCompiler.property_access("^last_bookmark$").unwrap();
        let src = "b = session.last_bookmark\nsession.last_bookmark()\n";
        assert_eq!(spans(&q, src, false), vec![(0, 12, 25), (1, 8, 21)]);
    }

    #[test]
    fn import_statement() {
        let q = PythonCompiler.import("neo4j\\\\.Bookmark$").unwrap();
        let src = "import os\nimport neo4j.Bookmark\n";
        assert_eq!(spans(&q, src, false), vec![(1, 7, 21)]);
    }

    #[test]
    fn import_from_name_reports_both_or_last() {
        let q = PythonCompiler
            .import_from_name("^neo4j$", "^Bookmark$")
            .unwrap();
        let src = "from neo4j import Bookmark\n";
        assert_eq!(spans(&q, src, false), vec![(0, 5, 10), (0, 18, 26)]);
        assert_eq!(spans(&q, src, true), vec![(0, 18, 26)]);
    }

    #[test]
    fn import_from_module() {
        let q = PythonCompiler.import_from_module("^neo4j\\\\.work$").unwrap();
        let src = "from neo4j.work import Query\nfrom neo4j import Query\n";
        assert_eq!(spans(&q, src, false), vec![(0, 5, 15)]);
    }

    #[test]
    fn method_keyword_argument_dedup_keeps_keyword() {
        let q = PythonCompiler
            .method_call_with_keyword_argument("^session$", "^fetch_size$")
            .unwrap();
        let src = "s = driver.session(database='x', fetch_size=10)\n";
        assert_eq!(spans(&q, src, false), vec![(0, 11, 18), (0, 33, 43)]);
        assert_eq!(spans(&q, src, true), vec![(0, 33, 43)]);
    }

    #[test]
    fn function_keyword_argument_value() {
        let q = PythonCompiler
            .function_call_with_keyword_argument_value("^GraphDatabase$", "^trust$", "TRUST_ALL")
            .unwrap();
        let src = "d = GraphDatabase(uri, trust=TRUST_ALL_CERTIFICATES)\nd = GraphDatabase(uri, trust=None)\n";
        assert_eq!(spans(&q, src, true), vec![(0, 29, 51)]);
    }

    #[test]
    fn negated_type_condition() {
        let q = PythonCompiler
            .type_reference(&["\\\\bConfig\\\\b", "?!neo4j\\\\.Config"])
            .unwrap();
        let src = "def f(a: Config, b: neo4j.Config): pass\n";
        assert_eq!(spans(&q, src, true), vec![(0, 9, 15)]);
    }

    #[test]
    fn function_call_with_argument() {
        let q = PythonCompiler
            .function_call_with_argument("\\\\.run$", "\\\\{")
            .unwrap();
        let src = "session.run('RETURN 1', {'a': 1})\nsession.run('RETURN 1')\n";
        assert_eq!(spans(&q, src, true), vec![(0, 11, 33)]);
    }

    #[test]
    fn invalid_regex_is_error() {
        assert!(PythonCompiler.method_call("(").is_err());
    }

    #[test]
    fn namespace_alias_extracted_from_aliased_import() {
        let lib = Language::Python.default_library();
        let lang = PythonCompiler.ts_language();
        let src = "import os\nimport neo4j as n\nimport neo4j.time as t\nimport neo4j\n";
        let tree = parse_tree(&lang, src).unwrap();
        let hits = query::run(
            &lang,
            &PythonCompiler.namespace_import_query(&lib),
            &tree,
            src.as_bytes(),
        )
        .unwrap();
        let bindings: Vec<ImportBinding> = hits
            .iter()
            .filter_map(|h| PythonCompiler.extract_alias(h, &lib))
            .collect();
        assert_eq!(
            bindings,
            vec![
                ImportBinding {
                    canonical: "neo4j".to_string(),
                    alias: "n".to_string()
                },
                ImportBinding {
                    canonical: "neo4j.time".to_string(),
                    alias: "t".to_string()
                },
            ]
        );
    }
}
