use crate::contract::TypeRef;

/// `Name`, or `Name[Arg1,Arg2]` for generic types, recursively
pub fn default_schema_id(ty: &TypeRef) -> String {
    let ty = ty.unwrap_transparent();
    if ty.args.is_empty() {
        return ty.name.clone();
    }
    let args: Vec<String> = ty.args.iter().map(default_schema_id).collect();
    format!("{}[{}]", ty.name, args.join(","))
}

/// Like [`default_schema_id`] with each name prefixed by its module path (`orders.Item`)
pub fn full_schema_id(ty: &TypeRef) -> String {
    let ty = ty.unwrap_transparent();
    let mut id = ty.module.join(".");
    if !id.is_empty() {
        id.push('.');
    }
    id.push_str(&ty.name);
    if !ty.args.is_empty() {
        let args: Vec<String> = ty.args.iter().map(full_schema_id).collect();
        id.push_str(&format!("[{}]", args.join(",")));
    }
    id
}
