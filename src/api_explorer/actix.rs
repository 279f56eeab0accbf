use crate::api_explorer::{
    ApiDescription, ApiDescriptionProvider, ApiParameter, ApiResponseType, BindingSource,
    HttpMethod,
};
use crate::contract::attributes::{doc_comments, is_deprecated};
use crate::contract::source::SourceContractResolver;
use crate::contract::{ContractKind, DataContractResolver, TypeRef, INFERRED_NAME};
use crate::source::{SourceFile, SourceTree};
use heck::ToTrainCase;
use log::debug;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use syn::punctuated::Punctuated;
use syn::{visit::Visit, Attribute, Expr, ExprMethodCall, Lit, Meta, Token};

/// Discovers actix-web attribute routes (`#[get("/users")]`, `#[route(..)]`) in a source tree
pub struct ActixApiExplorer<'a> {
    files: &'a [SourceFile],
    contracts: &'a SourceContractResolver,
}

impl<'a> ActixApiExplorer<'a> {
    pub fn new(tree: &'a SourceTree, contracts: &'a SourceContractResolver) -> Self {
        Self::from_files(&tree.files, contracts)
    }

    pub fn from_files(files: &'a [SourceFile], contracts: &'a SourceContractResolver) -> Self {
        Self { files, contracts }
    }
}

impl ApiDescriptionProvider for ActixApiExplorer<'_> {
    fn api_descriptions(&self) -> Vec<ApiDescription> {
        let mut visitor = ActixVisitor::default();

        // First pass: collect handlers and scope registrations from all files
        for file in self.files {
            visitor.module = file.module_path.clone();
            visitor.scope.clear();
            visitor.visit_file(&file.syntax_tree);
        }

        // Scopes may be registered in a different file than the handler
        let descriptions: Vec<ApiDescription> = visitor
            .handlers
            .iter()
            .flat_map(|handler| {
                let prefix = visitor
                    .scoped_handlers
                    .get(&handler.item.sig.ident.to_string())
                    .map(String::as_str)
                    .unwrap_or("");
                self.describe(handler, prefix)
            })
            .collect();

        debug!("Discovered {} actix endpoints", descriptions.len());
        descriptions
    }
}

impl ActixApiExplorer<'_> {
    /// One description per method the handler is bound to
    fn describe(&self, handler: &HandlerRoute, prefix: &str) -> Vec<ApiDescription> {
        let item = &handler.item;
        let module = &handler.module;
        let path = combine_paths(prefix, &handler.path);
        let fn_name = item.sig.ident.to_string();
        let action_name = if module.is_empty() {
            fn_name
        } else {
            format!("{}::{}", module.join("::"), fn_name)
        };

        let parameters = self.parameters(&item.sig, module, &path);
        let (return_type, responses) = self.response_binding(&item.sig.output, module);
        let mut attributes: BTreeMap<String, String> = BTreeMap::new();
        let remaining = item.attrs.iter().filter(|attr| {
            parse_route(attr).is_none()
                && !attr.path().is_ident("doc")
                && !attr.path().is_ident("deprecated")
        });
        for attr in remaining {
            let args = match &attr.meta {
                Meta::List(list) => list.tokens.to_string(),
                Meta::NameValue(nv) => quote_free(&nv.value),
                Meta::Path(_) => String::new(),
            };
            // repeated attributes keep every argument list
            match attributes.entry(path_string(attr.path())) {
                Entry::Occupied(mut entry) if !args.is_empty() => {
                    let existing = entry.get_mut();
                    if !existing.is_empty() {
                        existing.push_str(", ");
                    }
                    existing.push_str(&args);
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(entry) => {
                    entry.insert(args);
                }
            }
        }

        handler
            .methods
            .iter()
            .map(|method| ApiDescription {
                action_name: action_name.clone(),
                group_name: module.last().cloned(),
                http_method: *method,
                relative_path: path.clone(),
                parameters: parameters.clone(),
                supported_response_types: responses.clone(),
                return_type: return_type.clone(),
                obsolete: is_deprecated(&item.attrs),
                docs: doc_comments(&item.attrs),
                attributes: attributes.clone(),
            })
            .collect()
    }

    /// Parameters bound by the handler's extractors
    fn parameters(&self, sig: &syn::Signature, module: &[String], path: &str) -> Vec<ApiParameter> {
        let placeholders = path_placeholders(path);
        let mut path_types: HashMap<String, TypeRef> = HashMap::new();
        let mut parameters = Vec::new();

        for input in &sig.inputs {
            let syn::FnArg::Typed(pat_type) = input else {
                continue;
            };
            let arg_name = match &*pat_type.pat {
                syn::Pat::Ident(ident) => ident.ident.to_string(),
                _ => "body".to_string(),
            };
            let declared = TypeRef::from_syn(&pat_type.ty);
            let optional = declared.is_nullable();
            let extractor = declared.unwrap_transparent();
            let Some(inner) = extractor.args.first() else {
                continue;
            };
            let inner = self.contracts.qualify(inner, module);

            match extractor.name.as_str() {
                "Path" => path_types.extend(self.path_bindings(&inner, &placeholders)),
                "Query" => parameters.extend(self.expand_fields(
                    &arg_name,
                    &inner,
                    BindingSource::Query,
                    optional,
                )),
                "Form" => parameters.extend(self.expand_fields(
                    &arg_name,
                    &inner,
                    BindingSource::Form,
                    optional,
                )),
                "Json" => parameters.push(ApiParameter::new(
                    arg_name,
                    BindingSource::Body,
                    inner,
                    !optional,
                )),
                "Header" => parameters.push(ApiParameter::new(
                    inner.name.to_train_case(),
                    BindingSource::Header,
                    TypeRef::new("String"),
                    !optional,
                )),
                _ => {}
            }
        }

        // Every placeholder is a path parameter; uncovered ones default to strings
        let mut path_parameters: Vec<ApiParameter> = placeholders
            .into_iter()
            .map(|name| {
                let ty = path_types
                    .remove(&name)
                    .unwrap_or_else(|| TypeRef::new("String"));
                ApiParameter::path(name, ty)
            })
            .collect();
        path_parameters.extend(parameters);
        path_parameters
    }

    /// Map the `Path<T>` type onto the template placeholders
    fn path_bindings(&self, ty: &TypeRef, placeholders: &[String]) -> Vec<(String, TypeRef)> {
        if ty.is_tuple() {
            return placeholders.iter().cloned().zip(ty.args.iter().cloned()).collect();
        }
        match self.contracts.resolve(ty).kind {
            ContractKind::Object(object) => object
                .properties
                .into_iter()
                .filter(|p| !p.ignored)
                .map(|p| (p.name, p.ty))
                .collect(),
            _ => placeholders
                .first()
                .map(|name| vec![(name.clone(), ty.clone())])
                .unwrap_or_default(),
        }
    }

    /// Expand a struct extractor into one parameter per field
    fn expand_fields(
        &self,
        arg_name: &str,
        ty: &TypeRef,
        source: BindingSource,
        optional: bool,
    ) -> Vec<ApiParameter> {
        match self.contracts.resolve(ty).kind {
            ContractKind::Object(object) => object
                .properties
                .into_iter()
                .filter(|p| !p.ignored)
                .map(|p| ApiParameter {
                    name: p.name,
                    source,
                    required: p.required && !optional,
                    deprecated: p.obsolete,
                    description: p.docs,
                    ty: p.ty,
                })
                .collect(),
            _ => vec![ApiParameter::new(
                arg_name,
                source,
                ty.clone(),
                !optional && !ty.is_nullable(),
            )],
        }
    }

    /// Return type and declared responses from the handler's output type
    fn response_binding(
        &self,
        output: &syn::ReturnType,
        module: &[String],
    ) -> (Option<TypeRef>, Vec<ApiResponseType>) {
        let syn::ReturnType::Type(_, ty) = output else {
            return (None, Vec::new());
        };
        let mut ty = TypeRef::from_syn(ty);
        if ty.name == "Result" {
            match ty.args.first() {
                Some(ok) => ty = ok.clone(),
                None => return (None, Vec::new()),
            }
        }

        match ty.name.as_str() {
            "Json" => (
                ty.args.first().map(|inner| self.contracts.qualify(inner, module)),
                Vec::new(),
            ),
            _ if ty.is_tuple() && ty.args.is_empty() => (None, Vec::new()),
            "HttpResponse" | "HttpResponseBuilder" | "Either" | INFERRED_NAME => {
                (None, vec![ApiResponseType::new(200, None)])
            }
            _ => (Some(self.contracts.qualify(&ty, module)), Vec::new()),
        }
    }
}

/// A handler with its route attribute, before scope prefixes are applied
struct HandlerRoute {
    item: syn::ItemFn,
    module: Vec<String>,
    /// Module scope joined with the attribute path
    path: String,
    methods: Vec<Option<HttpMethod>>,
}

/// Visitor for traversing the AST and finding Actix-Web routes
#[derive(Default)]
struct ActixVisitor {
    handlers: Vec<HandlerRoute>,
    module: Vec<String>,
    /// Prefix from enclosing `#[scope]` modules
    scope: String,
    /// Handler name → prefix of the `web::scope` it is registered in
    scoped_handlers: HashMap<String, String>,
}

impl ActixVisitor {
    /// Record scope prefixes for handlers registered through `.service(..)` chains.
    /// Returns whether the chain registered any service.
    fn register_service_chain(&mut self, node: &ExprMethodCall, prefix: &str) -> bool {
        let mut services: Vec<&Expr> = Vec::new();
        if node.method == "service" {
            services.extend(node.args.first());
        }
        let mut receiver: &Expr = &node.receiver;
        while let Expr::MethodCall(call) = receiver {
            if call.method == "service" {
                services.extend(call.args.first());
            }
            receiver = &call.receiver;
        }
        if services.is_empty() {
            return false;
        }

        let local = match scope_call_path(receiver) {
            Some(scope) => combine_paths(prefix, &scope),
            None => prefix.to_string(),
        };
        for service in services {
            match service {
                Expr::Path(path) => {
                    if let Some(segment) = path.path.segments.last() {
                        self.scoped_handlers
                            .insert(segment.ident.to_string(), local.clone());
                    }
                }
                Expr::MethodCall(inner) => {
                    self.register_service_chain(inner, &local);
                }
                _ => {}
            }
        }
        true
    }
}

impl<'ast> Visit<'ast> for ActixVisitor {
    fn visit_item_fn(&mut self, node: &'ast syn::ItemFn) {
        let bindings: Vec<RouteBinding> = node.attrs.iter().filter_map(parse_route).collect();
        for binding in bindings {
            debug!(
                "Found route {} on handler {}",
                binding.path, node.sig.ident
            );
            self.handlers.push(HandlerRoute {
                item: node.clone(),
                module: self.module.clone(),
                path: combine_paths(&self.scope, &binding.path),
                methods: binding.methods,
            });
        }

        syn::visit::visit_item_fn(self, node);
    }

    fn visit_item_mod(&mut self, node: &'ast syn::ItemMod) {
        let old_scope = self.scope.clone();
        if let Some(scope) = node
            .attrs
            .iter()
            .filter(|attr| attr.path().is_ident("scope"))
            .find_map(|attr| attr.parse_args::<syn::LitStr>().ok())
        {
            self.scope = combine_paths(&old_scope, &scope.value());
        }
        self.module.push(node.ident.to_string());

        syn::visit::visit_item_mod(self, node);

        self.module.pop();
        self.scope = old_scope;
    }

    fn visit_expr_method_call(&mut self, node: &'ast syn::ExprMethodCall) {
        if self.register_service_chain(node, "") {
            return;
        }
        syn::visit::visit_expr_method_call(self, node);
    }
}

struct RouteBinding {
    path: String,
    methods: Vec<Option<HttpMethod>>,
}

/// Parse `#[get("/p")]`-style and `#[route("/p", method = "GET", ..)]` attributes
fn parse_route(attr: &Attribute) -> Option<RouteBinding> {
    let name = attr.path().segments.last()?.ident.to_string();
    let fixed = if name == "route" {
        None
    } else {
        Some(HttpMethod::try_from(name.as_str()).ok()?)
    };

    let args = attr
        .parse_args_with(Punctuated::<Expr, Token![,]>::parse_terminated)
        .ok()?;
    let mut path = None;
    let mut methods = Vec::new();
    for arg in &args {
        match arg {
            Expr::Lit(lit) if path.is_none() => {
                if let Lit::Str(s) = &lit.lit {
                    path = Some(s.value());
                }
            }
            Expr::Assign(assign) => {
                let is_method =
                    matches!(&*assign.left, Expr::Path(p) if p.path.is_ident("method"));
                if let (true, Some(value)) = (is_method, string_literal(&assign.right)) {
                    match HttpMethod::try_from(value.as_str()) {
                        Ok(method) => methods.push(method),
                        Err(e) => debug!("{}", e),
                    }
                }
            }
            _ => {}
        }
    }

    let methods = match fixed {
        Some(method) => vec![Some(method)],
        None if methods.is_empty() => vec![None],
        None => methods.into_iter().map(Some).collect(),
    };
    Some(RouteBinding {
        path: path?,
        methods,
    })
}

/// The literal path of a `web::scope("/p")` call
fn scope_call_path(expr: &Expr) -> Option<String> {
    let Expr::Call(call) = expr else {
        return None;
    };
    let Expr::Path(func) = &*call.func else {
        return None;
    };
    if func.path.segments.last()?.ident != "scope" {
        return None;
    }
    string_literal(call.args.first()?)
}

fn string_literal(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(expr_lit) => match &expr_lit.lit {
            Lit::Str(lit_str) => Some(lit_str.value()),
            _ => None,
        },
        _ => None,
    }
}

fn quote_free(expr: &Expr) -> String {
    string_literal(expr).unwrap_or_default()
}

fn path_string(path: &syn::Path) -> String {
    path.segments
        .iter()
        .map(|s| s.ident.to_string())
        .collect::<Vec<_>>()
        .join("::")
}

/// Combine scope and path, handling slashes correctly
fn combine_paths(scope: &str, path: &str) -> String {
    if scope.is_empty() {
        return path.to_string();
    }

    let scope = scope.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        scope.to_string()
    } else {
        format!("{}/{}", scope, path)
    }
}

/// Placeholder names of a path template, in order (`{id:\d+}` → `id`)
fn path_placeholders(path: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else { break };
        let inner = &after[..end];
        let name = inner.split(':').next().unwrap_or(inner).trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
        rest = &after[end + 1..];
    }
    names
}
