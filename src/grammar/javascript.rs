use super::{
    CompiledQuery, ImportBinding, Language, Library, PatternCompiler, escape_literal,
    match_condition, stacked_conditions,
};
use crate::error::PatternCompileError;
use crate::query::QueryHit;

/// JavaScript options travel in object literals; a keyword is a property
/// key of an object argument.
pub struct JavaScriptCompiler;

const FUNCTION_CALLEE: &str = "[
    (member_expression)
    (identifier)
  ] @function_name
  {cond}";

const METHOD_CALLEE: &str = "(member_expression
    property: (property_identifier) @method_name
    {cond})";

impl JavaScriptCompiler {
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
                    "\n        value: (_) @kwarg_value\n        {}",
                    match_condition("kwarg_value", v)?
                ),
                vec![callee_capture, "kwarg_name", "kwarg_value"],
            ),
            None => (String::new(), vec![callee_capture, "kwarg_name"]),
        };
        let callee = callee.replace("{cond}", &callee_cond);
        Ok(CompiledQuery::new(
            format!(
                "(call_expression
  function: {callee}
  arguments: (arguments
    (object
      (pair
        key: (property_identifier) @kwarg_name
        {keyword_cond}{value_part}))))"
            ),
            &captures,
        ))
    }
}

impl PatternCompiler for JavaScriptCompiler {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn ts_language(&self) -> tree_sitter::Language {
        tree_sitter_javascript::LANGUAGE.into()
    }

    fn function_call(&self, name: &str) -> Result<CompiledQuery, PatternCompileError> {
        let callee = FUNCTION_CALLEE.replace("{cond}", &match_condition("function_name", name)?);
        Ok(CompiledQuery::new(
            format!("(call_expression\n  function: {callee})"),
            &["function_name"],
        ))
    }

    /// Any member access counts, called or not; a method reference passed
    /// as a callback is still a use of the method.
    fn method_call(&self, name: &str) -> Result<CompiledQuery, PatternCompileError> {
        let cond = match_condition("method_name", name)?;
        Ok(CompiledQuery::new(
            format!(
                "(member_expression
  property: (property_identifier) @method_name
  {cond})"
            ),
            &["method_name"],
        ))
    }

    fn property_access(&self, name: &str) -> Result<CompiledQuery, PatternCompileError> {
        let cond = match_condition("property_name", name)?;
        Ok(CompiledQuery::new(
            format!(
                "(member_expression
  property: (property_identifier) @property_name
  {cond})"
            ),
            &["property_name"],
        ))
    }

    /// JavaScript has no type annotations; a type is referenced when it is
    /// constructed.
    fn type_reference(&self, conditions: &[&str]) -> Result<CompiledQuery, PatternCompileError> {
        let (captures, conds, names) = stacked_conditions("type_name", conditions)?;
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        Ok(CompiledQuery::new(
            format!(
                "(new_expression
  constructor: (_) {captures}
  {conds})"
            ),
            &names,
        ))
    }

    /// ES imports and CommonJS `require` calls.
    fn import(&self, name: &str) -> Result<CompiledQuery, PatternCompileError> {
        let cond = match_condition("name", name)?;
        Ok(CompiledQuery::new(
            format!(
                "(import_statement
  source: (string) @name
  {cond})

(call_expression
  function: (identifier) @_require
  arguments: (arguments . (string) @name)
  (#eq? @_require \"require\")
  {cond})"
            ),
            &["name"],
        ))
    }

    fn import_from_module(&self, module: &str) -> Result<CompiledQuery, PatternCompileError> {
        let cond = match_condition("module_name", module)?;
        Ok(CompiledQuery::new(
            format!(
                "(import_statement
  (import_clause)
  source: (string) @module_name
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
                "(import_statement
  (import_clause
    (named_imports
      (import_specifier
        name: (identifier) @name
        {name_cond})))
  source: (string) @module_name
  {module_cond})"
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
                "(call_expression
  function: [
    (member_expression) @function
    (identifier) @function
  ]
  arguments: (arguments) @args
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
            "(variable_declarator
  name: (identifier) @alias
  value: (call_expression
    function: (identifier) @_require
    arguments: (arguments . (string) @source)
    (#eq? @_require \"require\")
    (#match? @source \"{regex}\")))

(import_statement
  (import_clause
    [
      (identifier) @alias
      (namespace_import (identifier) @alias)
    ])
  source: (string) @source
  (#match? @source \"{regex}\"))"
        )
    }

    /// The driver has no sub-packages, so every binding maps to the
    /// library's namespace.
    fn extract_alias(&self, hit: &QueryHit, library: &Library) -> Option<ImportBinding> {
        let alias = hit.get("alias")?.text.clone();
        Some(ImportBinding {
            canonical: library.namespace.clone(),
            alias,
        })
    }
}
