use super::{
    CompiledQuery, ImportBinding, Language, Library, PatternCompiler, escape_literal,
    match_condition, stacked_conditions,
};
use crate::error::PatternCompileError;
use crate::query::QueryHit;

/// Go has no keyword arguments; options are passed as composite literals
/// (`neo4j.SessionConfig{DatabaseName: "x"}`), possibly behind `&`. A
/// keyword is a literal key, its value the keyed element's value.
pub struct GoCompiler;

const FUNCTION_CALLEE: &str = "[
    (selector_expression)
    (identifier)
  ] @function_name
  {cond}";

const METHOD_CALLEE: &str = "(selector_expression
    field: (field_identifier) @method_name
    {cond})";

fn keyed_literal(keyword_cond: &str, value_part: &str) -> String {
    let body = format!(
        "body: (literal_value
        (keyed_element
          .
          (literal_element (identifier) @kwarg_name)
          {keyword_cond}
          (literal_element){value_part}))"
    );
    format!(
        "[
      (composite_literal
        {body})
      (unary_expression
        operand: (composite_literal
          {body}))
    ]"
    )
}

impl GoCompiler {
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
                format!(" @kwarg_value\n          {}", match_condition("kwarg_value", v)?),
                vec![callee_capture, "kwarg_name", "kwarg_value"],
            ),
            None => (String::new(), vec![callee_capture, "kwarg_name"]),
        };
        let callee = callee.replace("{cond}", &callee_cond);
        let literal = keyed_literal(&keyword_cond, &value_part);
        Ok(CompiledQuery::new(
            format!(
                "(call_expression
  function: {callee}
  arguments: (argument_list
    {literal}))"
            ),
            &captures,
        ))
    }
}

impl PatternCompiler for GoCompiler {
    fn language(&self) -> Language {
        Language::Go
    }

    fn ts_language(&self) -> tree_sitter::Language {
        tree_sitter_go::LANGUAGE.into()
    }

    fn function_call(&self, name: &str) -> Result<CompiledQuery, PatternCompileError> {
        let callee = FUNCTION_CALLEE.replace("{cond}", &match_condition("function_name", name)?);
        Ok(CompiledQuery::new(
            format!("(call_expression\n  function: {callee})"),
            &["function_name"],
        ))
    }

    fn method_call(&self, name: &str) -> Result<CompiledQuery, PatternCompileError> {
        let callee = METHOD_CALLEE.replace("{cond}", &match_condition("method_name", name)?);
        Ok(CompiledQuery::new(
            format!("(call_expression\n  function: {callee})"),
            &["method_name"],
        ))
    }

    fn property_access(&self, name: &str) -> Result<CompiledQuery, PatternCompileError> {
        let cond = match_condition("property_name", name)?;
        Ok(CompiledQuery::new(
            format!(
                "(selector_expression
  field: (field_identifier) @property_name
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
                "(_
  type: (_) {captures}
  {conds})"
            ),
            &names,
        ))
    }

    fn import(&self, name: &str) -> Result<CompiledQuery, PatternCompileError> {
        let cond = match_condition("name", name)?;
        Ok(CompiledQuery::new(
            format!(
                "(import_spec
  path: (interpreted_string_literal) @name
  {cond})"
            ),
            &["name"],
        ))
    }

    /// Go imports whole packages; the module is the import path.
    fn import_from_module(&self, module: &str) -> Result<CompiledQuery, PatternCompileError> {
        let cond = match_condition("module_name", module)?;
        Ok(CompiledQuery::new(
            format!(
                "(import_spec
  path: (interpreted_string_literal) @module_name
  {cond})"
            ),
            &["module_name"],
        ))
    }

    /// Both conditions apply to the import path.
    fn import_from_name(
        &self,
        module: &str,
        name: &str,
    ) -> Result<CompiledQuery, PatternCompileError> {
        let (captures, conds, names) = stacked_conditions("path", &[module, name])?;
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        Ok(CompiledQuery::new(
            format!(
                "(import_spec
  path: (interpreted_string_literal) {captures}
  {conds})"
            ),
            &names,
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
                "(call_expression
  function: [
    (selector_expression) @function
    (identifier) @function
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
            "(import_spec
  name: (package_identifier)? @alias
  path: (interpreted_string_literal) @path
  (#match? @path \"{regex}\"))"
        )
    }

    /// The package name is the last path segment; without an explicit name
    /// the package is referenced by that segment.
    fn extract_alias(&self, hit: &QueryHit, _library: &Library) -> Option<ImportBinding> {
        let path = hit.get("path")?.text.trim_matches('"');
        let canonical = path.rsplit('/').next()?.to_string();
        if canonical.is_empty() {
            return None;
        }
        let alias = match hit.get("alias") {
            Some(node) => node.text.clone(),
            None => canonical.clone(),
        };
        Some(ImportBinding { canonical, alias })
    }
}
