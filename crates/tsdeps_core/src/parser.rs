use anyhow::{Context, Result, bail};
use dashmap::DashMap;
use log::{debug, trace, warn};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_parser::{Parser as OxcParser, ParserReturn};
use oxc_span::SourceType;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::types::{SpecKind, Specifier};

pub fn imports_for(
    file: &Path,
    cache: &DashMap<PathBuf, Vec<Specifier>>,
) -> Result<Vec<Specifier>> {
    let file_buf = file.to_path_buf();
    if let Some(v) = cache.get(&file_buf) {
        trace!("Cache hit for imports: {}", file.display());
        return Ok(v.clone());
    }
    trace!("Parsing file for imports: {}", file.display());
    let src =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let specs = parse_specifiers(file, &src)?;

    debug!("Found {} import specifiers in {}", specs.len(), file.display());
    cache.insert(file_buf, specs.clone());
    Ok(specs)
}

fn parse_specifiers(file: &Path, src: &str) -> Result<Vec<Specifier>> {
    let st = source_type_for(file);
    let allocator = Allocator::default();
    let ParserReturn { program, errors, panicked, .. } =
        OxcParser::new(&allocator, src, st).parse();

    if panicked {
        bail!("Failed to parse {}: {} syntax error(s)", file.display(), errors.len());
    }
    if let Some(first) = errors.first() {
        warn!("{} syntax error(s) in {}, first: {}", errors.len(), file.display(), first);
    }

    let mut specs: Vec<Specifier> = Vec::new();

    for stmt in &program.body {
        match stmt {
            Statement::ImportDeclaration(decl) => {
                let req = decl.source.value.to_string();
                let kind = if is_type_only_import(decl) { SpecKind::TypeOnly } else { SpecKind::Static };
                trace!("Found {:?} import: '{}' in {}", kind, req, file.display());
                specs.push(Specifier { request: req, kind });
            }
            Statement::ExportAllDeclaration(decl) => {
                trace!("Found re-export: '{}' in {}", decl.source.value, file.display());
                specs.push(Specifier {
                    request: decl.source.value.to_string(),
                    kind: SpecKind::ReExport,
                });
            }
            Statement::ExportNamedDeclaration(decl) => {
                if let Some(source) = &decl.source {
                    trace!("Found re-export: '{}' in {}", source.value, file.display());
                    specs.push(Specifier {
                        request: source.value.to_string(),
                        kind: SpecKind::ReExport,
                    });
                }
            }
            Statement::ExpressionStatement(es) => {
                extract_calls_from_expression(&es.expression, &mut specs);
            }
            Statement::VariableDeclaration(vd) => {
                // const x = require('...') or const x = someFunc(require('...'))
                for decl in &vd.declarations {
                    if let Some(init) = &decl.init {
                        extract_calls_from_expression(init, &mut specs);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(specs)
}

/// `import type { A } from 'x'` or `import { type A, type B } from 'x'`.
/// Side-effect imports and empty braces are never type-only.
fn is_type_only_import(decl: &ImportDeclaration) -> bool {
    if decl.import_kind.is_type() {
        return true;
    }
    match &decl.specifiers {
        Some(specifiers) if !specifiers.is_empty() => specifiers.iter().all(|spec| match spec {
            ImportDeclarationSpecifier::ImportSpecifier(s) => s.import_kind.is_type(),
            ImportDeclarationSpecifier::ImportDefaultSpecifier(_)
            | ImportDeclarationSpecifier::ImportNamespaceSpecifier(_) => false,
        }),
        _ => false,
    }
}

fn extract_calls_from_expression(expr: &Expression, specs: &mut Vec<Specifier>) {
    match expr {
        Expression::CallExpression(ce) => {
            if let Expression::Identifier(callee_ident) = &ce.callee
                && callee_ident.name.as_str() == "require"
                && !ce.arguments.is_empty()
                && let Some(Expression::StringLiteral(sl)) = ce.arguments[0].as_expression()
            {
                trace!("Found require() call: '{}'", sl.value);
                specs.push(Specifier { request: sl.value.to_string(), kind: SpecKind::Require });
            }
            for arg in &ce.arguments {
                if let Some(arg_expr) = arg.as_expression() {
                    extract_calls_from_expression(arg_expr, specs);
                }
            }
            extract_calls_from_expression(&ce.callee, specs);
        }
        Expression::ImportExpression(ie) => {
            if let Expression::StringLiteral(sl) = &ie.source {
                trace!("Found dynamic import(): '{}'", sl.value);
                specs.push(Specifier { request: sl.value.to_string(), kind: SpecKind::Dynamic });
            }
        }
        Expression::AwaitExpression(ae) => {
            extract_calls_from_expression(&ae.argument, specs);
        }
        Expression::ArrayExpression(ae) => {
            for elem in &ae.elements {
                if let Some(expr) = elem.as_expression() {
                    extract_calls_from_expression(expr, specs);
                }
            }
        }
        Expression::ObjectExpression(oe) => {
            for prop in &oe.properties {
                if let Some(expr) = prop.as_property() {
                    extract_calls_from_expression(&expr.value, specs);
                }
            }
        }
        Expression::ConditionalExpression(ce) => {
            extract_calls_from_expression(&ce.test, specs);
            extract_calls_from_expression(&ce.consequent, specs);
            extract_calls_from_expression(&ce.alternate, specs);
        }
        Expression::AssignmentExpression(ae) => {
            extract_calls_from_expression(&ae.right, specs);
        }
        Expression::ParenthesizedExpression(pe) => {
            extract_calls_from_expression(&pe.expression, specs);
        }
        _ => {}
    }
}

fn source_type_for(path: &Path) -> SourceType {
    let ext = path.extension().and_then(|e| e.to_str());

    SourceType::default()
        .with_module(true)
        .with_jsx(matches!(ext, Some("tsx") | Some("jsx")))
        .with_typescript(matches!(ext, Some("ts") | Some("tsx") | Some("mts") | Some("cts")))
}
