//! Compile-time checks the interpreter does not perform.
//!
//! Lua resolves globals at run time, so a typo such as `ast.name` for
//! `asset.name` would only fail once that line runs. The lint walks the
//! token stream with a light scope model and rejects:
//!
//! - free names that are neither locals in scope, known globals, nor
//!   globals the script assigns itself;
//! - `import` of a literal module name outside the allow-list;
//! - more constant objects (distinct literals plus function prototypes)
//!   than the configured limit.
//!
//! The scope model errs towards accepting code: when unsure, a name is
//! treated as declared.

use std::collections::{BTreeSet, HashSet};

use crate::lexer::{tokenize, Spanned, Token};
use crate::modules;
use crate::{Error, Resource, Result, ScriptLimits};

/// Globals every sandbox provides before host bindings are added.
pub(crate) const BASE_GLOBALS: &[&str] = &[
    "_G", "_VERSION", "assert", "error", "ipairs", "next", "pairs", "print", "rawequal", "rawget",
    "rawlen", "rawset", "select", "tonumber", "tostring", "type", "math", "string", "table",
    "utf8", "import",
];

/// What the lint learned about a script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Report {
    pub constants: usize,
    pub imports: Vec<String>,
}

pub(crate) fn check(source: &str, declared: &BTreeSet<String>, limits: &ScriptLimits) -> Result<Report> {
    let tokens = tokenize(source).map_err(|message| Error::Compile { message })?;
    let mut resolver = Resolver::new(&tokens);
    resolver.run()?;

    for (name, line) in &resolver.references {
        let known = BASE_GLOBALS.contains(&name.as_str())
            || declared.contains(name)
            || resolver.assigned.contains(name);
        if !known {
            return Err(Error::Compile {
                message: format!("unresolved reference '{name}' at line {line}"),
            });
        }
    }

    let constants = resolver.literals.len() + resolver.functions;
    if constants > limits.max_const_objects {
        return Err(Error::ResourceLimitExceeded {
            resource: Resource::Constants,
            limit: limits.max_const_objects as u64,
        });
    }

    Ok(Report {
        constants,
        imports: resolver.imports,
    })
}

#[derive(Debug)]
enum Frame {
    Block {
        locals: HashSet<String>,
        awaiting_do: bool,
    },
    Brace,
    Paren,
    Bracket,
}

struct Resolver<'t> {
    tokens: &'t [Spanned],
    frames: Vec<Frame>,
    references: Vec<(String, usize)>,
    assigned: HashSet<String>,
    literals: HashSet<String>,
    functions: usize,
    imports: Vec<String>,
}

impl<'t> Resolver<'t> {
    fn new(tokens: &'t [Spanned]) -> Self {
        Resolver {
            tokens,
            frames: vec![Frame::Block {
                locals: HashSet::new(),
                awaiting_do: false,
            }],
            references: Vec::new(),
            assigned: HashSet::new(),
            literals: HashSet::new(),
            functions: 0,
            imports: Vec::new(),
        }
    }

    fn run(&mut self) -> Result<()> {
        let mut i = 0;
        while i < self.tokens.len() {
            i = self.step(i)?;
        }
        Ok(())
    }

    fn step(&mut self, i: usize) -> Result<usize> {
        let tokens = self.tokens;
        let line = tokens[i].line;
        let next = match &tokens[i].token {
            Token::Keyword("local") => self.local(i),
            Token::Keyword("function") => {
                self.functions += 1;
                self.function(i + 1, line)
            }
            Token::Keyword("for") => {
                let mut j = i + 1;
                let mut locals = HashSet::new();
                while let Some(name) = self.name_at(j) {
                    locals.insert(name.to_string());
                    j += 1;
                    if !self.is_symbol(j, ",") {
                        break;
                    }
                    j += 1;
                }
                self.frames.push(Frame::Block {
                    locals,
                    awaiting_do: true,
                });
                j
            }
            Token::Keyword("do") => {
                match self.frames.last_mut() {
                    Some(Frame::Block { awaiting_do, .. }) if *awaiting_do => *awaiting_do = false,
                    _ => self.push_block(),
                }
                i + 1
            }
            Token::Keyword("then") | Token::Keyword("repeat") => {
                self.push_block();
                i + 1
            }
            Token::Keyword("elseif") | Token::Keyword("end") => {
                self.pop_block();
                i + 1
            }
            Token::Keyword("else") => {
                self.pop_block();
                self.push_block();
                i + 1
            }
            Token::Keyword("until") => {
                // The condition still sees the loop body's locals.
                let locals = self.pop_block();
                if let Some(Frame::Block { locals: parent, .. }) = self.innermost_block() {
                    parent.extend(locals);
                }
                i + 1
            }
            Token::Keyword("goto") => i + 2,
            Token::Symbol("::") => i + 3,
            Token::Symbol("{") => {
                self.frames.push(Frame::Brace);
                i + 1
            }
            Token::Symbol("(") => {
                self.frames.push(Frame::Paren);
                i + 1
            }
            Token::Symbol("[") => {
                self.frames.push(Frame::Bracket);
                i + 1
            }
            Token::Symbol("}") | Token::Symbol(")") | Token::Symbol("]") => {
                if matches!(
                    self.frames.last(),
                    Some(Frame::Brace | Frame::Paren | Frame::Bracket)
                ) {
                    self.frames.pop();
                }
                i + 1
            }
            Token::Str(text) => {
                self.literals.insert(format!("s:{text}"));
                i + 1
            }
            Token::Number(text) => {
                self.literals.insert(format!("n:{text}"));
                i + 1
            }
            Token::Name(name) => self.name(i, name, line)?,
            _ => i + 1,
        };
        Ok(next)
    }

    fn local(&mut self, i: usize) -> usize {
        if self.is_keyword(i + 1, "function") {
            self.functions += 1;
            let mut j = i + 2;
            if let Some(name) = self.name_at(j) {
                let name = name.to_string();
                self.declare(name);
                j += 1;
            }
            return self.open_function(j, false);
        }

        let mut j = i + 1;
        let mut names = Vec::new();
        while let Some(name) = self.name_at(j) {
            names.push(name.to_string());
            j += 1;
            if self.is_symbol(j, "<") {
                // attribute: <const> or <close>
                j += 3;
            }
            if !self.is_symbol(j, ",") {
                break;
            }
            j += 1;
        }
        for name in names {
            self.declare(name);
        }
        j
    }

    fn function(&mut self, mut j: usize, line: usize) -> usize {
        let mut method = false;
        if let Some(name) = self.name_at(j) {
            let name = name.to_string();
            j += 1;
            let mut dotted = false;
            while self.is_symbol(j, ".") || self.is_symbol(j, ":") {
                method |= self.is_symbol(j, ":");
                dotted = true;
                j += 2;
            }
            if !self.is_local(&name) {
                if dotted {
                    self.references.push((name, line));
                } else {
                    self.assigned.insert(name);
                }
            }
        }
        self.open_function(j, method)
    }

    /// Declare parameters from the `(` at `j`; returns the index past `)`.
    fn open_function(&mut self, mut j: usize, method: bool) -> usize {
        let mut locals = HashSet::new();
        if method {
            locals.insert("self".to_string());
        }
        if self.is_symbol(j, "(") {
            j += 1;
            while j < self.tokens.len() && !self.is_symbol(j, ")") {
                if let Some(name) = self.name_at(j) {
                    locals.insert(name.to_string());
                }
                j += 1;
            }
            j += 1;
        }
        self.frames.push(Frame::Block {
            locals,
            awaiting_do: false,
        });
        j
    }

    fn name(&mut self, i: usize, name: &str, line: usize) -> Result<usize> {
        let next = i + 1;
        if i > 0 && (self.is_symbol(i - 1, ".") || self.is_symbol(i - 1, ":")) {
            return Ok(next);
        }
        let in_table = matches!(self.frames.last(), Some(Frame::Brace));
        let opens_field = i > 0
            && (self.is_symbol(i - 1, "{") || self.is_symbol(i - 1, ",") || self.is_symbol(i - 1, ";"));
        if in_table && opens_field && self.is_symbol(next, "=") {
            return Ok(next);
        }
        if self.is_local(name) {
            return Ok(next);
        }
        if name == "import" {
            self.import(i, line)?;
        }

        let bare = self.is_symbol(next, "=") || self.is_symbol(next, ",");
        if !in_table && bare && self.starts_assignment(i) {
            self.assigned.insert(name.to_string());
        } else {
            self.references.push((name.to_string(), line));
        }
        Ok(next)
    }

    fn import(&mut self, i: usize, line: usize) -> Result<()> {
        let module = if self.is_symbol(i + 1, "(") {
            match (self.str_at(i + 2), self.is_symbol(i + 3, ")")) {
                (Some(module), true) => Some(module),
                _ => {
                    return Err(Error::Compile {
                        message: format!(
                            "import expects a string literal module name at line {line}"
                        ),
                    })
                }
            }
        } else {
            self.str_at(i + 1)
        };

        if let Some(module) = module {
            if !modules::is_allowed(module) {
                return Err(Error::Compile {
                    message: format!("module '{module}' not found at line {line}"),
                });
            }
            self.imports.push(module.to_string());
        }
        Ok(())
    }

    /// Whether the name at `i` begins the target list of an assignment.
    fn starts_assignment(&self, i: usize) -> bool {
        let mut depth = 0usize;
        let mut j = i + 1;
        while let Some(spanned) = self.tokens.get(j) {
            match &spanned.token {
                Token::Symbol("(") | Token::Symbol("[") => depth += 1,
                Token::Symbol(")") | Token::Symbol("]") => {
                    if depth == 0 {
                        return false;
                    }
                    depth -= 1;
                }
                _ if depth > 0 => {}
                Token::Symbol("=") => return true,
                Token::Symbol(",") | Token::Symbol(".") => {}
                Token::Name(_) if self.is_symbol(j - 1, ",") || self.is_symbol(j - 1, ".") => {}
                _ => return false,
            }
            j += 1;
        }
        false
    }

    fn push_block(&mut self) {
        self.frames.push(Frame::Block {
            locals: HashSet::new(),
            awaiting_do: false,
        });
    }

    /// Pop up to and including the innermost block, returning its locals.
    fn pop_block(&mut self) -> HashSet<String> {
        // The outermost chunk block is never popped.
        while self.frames.len() > 1 {
            if let Some(Frame::Block { locals, .. }) = self.frames.pop() {
                return locals;
            }
        }
        HashSet::new()
    }

    fn innermost_block(&mut self) -> Option<&mut Frame> {
        self.frames
            .iter_mut()
            .rev()
            .find(|f| matches!(f, Frame::Block { .. }))
    }

    fn declare(&mut self, name: String) {
        if let Some(Frame::Block { locals, .. }) = self.innermost_block() {
            locals.insert(name);
        }
    }

    fn is_local(&self, name: &str) -> bool {
        self.frames.iter().any(|f| match f {
            Frame::Block { locals, .. } => locals.contains(name),
            _ => false,
        })
    }

    fn name_at(&self, j: usize) -> Option<&'t str> {
        match self.tokens.get(j).map(|s| &s.token) {
            Some(Token::Name(name)) => Some(name),
            _ => None,
        }
    }

    fn str_at(&self, j: usize) -> Option<&'t str> {
        match self.tokens.get(j).map(|s| &s.token) {
            Some(Token::Str(text)) => Some(text),
            _ => None,
        }
    }

    fn is_symbol(&self, j: usize, symbol: &str) -> bool {
        matches!(self.tokens.get(j).map(|s| &s.token), Some(Token::Symbol(s)) if *s == symbol)
    }

    fn is_keyword(&self, j: usize, keyword: &str) -> bool {
        matches!(self.tokens.get(j).map(|s| &s.token), Some(Token::Keyword(k)) if *k == keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lint(source: &str, declared: &[&str]) -> Result<Report> {
        let declared = declared.iter().map(|s| s.to_string()).collect();
        check(source, &declared, &ScriptLimits::default())
    }

    fn unresolved(source: &str) -> String {
        match lint(source, &["asset", "emit", "exit"]) {
            Err(Error::Compile { message }) => message,
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_locals_params_and_declared_globals() {
        let source = r#"
            local text = import("text")
            local function rename(col, suffix)
                return col.name .. suffix
            end
            for i, col in ipairs(asset.data.columns) do
                col.name = rename(col, "_" .. i)
            end
            local t = { name = "x", [1] = 2; other = text.to_upper("y") }
            if #t > 0 then local y = 1 elseif t.name then local z = 2 else exit() end
            repeat local n = 1 until n == 1
            function helper(x) return x end
            counter = 0
            counter = counter + helper(1)
            emit(asset)
        "#;
        let report = lint(source, &["asset", "emit", "exit"]).unwrap();
        assert_eq!(report.imports, vec!["text".to_string()]);
    }

    #[test]
    fn methods_bind_self() {
        let source = "local obj = {}\nfunction obj:greet() return self end\nobj:greet()";
        lint(source, &[]).unwrap();
    }

    #[test]
    fn multiple_assignment_targets_define_globals() {
        lint("a, b = 1, 2\nlocal t = {}\nc, t.x = 3, 4\nreturn a + b + c", &[]).unwrap();
    }

    #[test]
    fn rejects_unresolved_names() {
        assert_eq!(
            unresolved("local x = 1\nast.name = 'x'"),
            "unresolved reference 'ast' at line 2"
        );
        assert!(unresolved("do local y = 1 end\nreturn y").contains("'y'"));
        assert!(unresolved("local function f(a) return a end\nreturn a").contains("'a'"));
    }

    #[test]
    fn table_keys_are_not_references() {
        lint("local t = { undefined_key = 1, nested = { deep = true } }", &[]).unwrap();
        assert!(unresolved("local t = { k = missing }").contains("'missing'"));
    }

    #[test]
    fn rejects_disallowed_imports() {
        for source in [r#"local os = import("os")"#, r#"local s = import "./testdata/sum""#] {
            let message = unresolved(source);
            assert!(message.contains("not found"), "{message}");
        }
        assert!(unresolved("local name = 'text'\nlocal m = import(name)").contains("string literal"));
    }

    #[test]
    fn counts_distinct_constants() {
        let report = lint("local a = 'x' .. 'x' .. 'y'\nlocal b = 1 + 1\nlocal f = function() end", &[]).unwrap();
        // "x", "y", 1 and one function prototype
        assert_eq!(report.constants, 4);

        let limits = ScriptLimits {
            max_const_objects: 3,
            ..ScriptLimits::default()
        };
        let err = check(
            "local a = 'x' .. 'y' .. 'z' .. 'w'",
            &BTreeSet::new(),
            &limits,
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::ResourceLimitExceeded {
                resource: Resource::Constants,
                limit: 3,
            }
        );
    }
}
