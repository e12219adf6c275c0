//! Type model: structs, their exported fields and exported methods.
//!
//! Descriptors are cheap handles into a loaded package. Fields are derived
//! from the struct's type on every call and nested structs are looked up
//! again on every [`Field::as_struct`], so nothing here owns another struct.

use crate::parser::LoadedPackage;
use crate::types::{Func, NamedType, Type, Underlying, Var};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A named struct type declared in a loaded package.
#[derive(Clone)]
pub struct Struct {
    named: Arc<NamedType>,
    package: Arc<LoadedPackage>,
    comment: Option<String>,
    methods: Vec<Method>,
}

impl Struct {
    pub(crate) fn new(named: Arc<NamedType>, package: Arc<LoadedPackage>) -> Self {
        let comment = package.comment_for(&named.file, named.pos);
        let methods = named
            .methods
            .iter()
            .filter(|f| f.exported)
            .map(|f| Method::new(f.clone(), &package))
            .collect();
        Self {
            named,
            package,
            comment,
            methods,
        }
    }

    pub fn name(&self) -> &str {
        &self.named.name
    }

    /// `package::Name`, unique within one run.
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.package.package.name, self.named.name)
    }

    pub fn package_name(&self) -> &str {
        &self.package.package.name
    }

    /// The file declaring the struct.
    pub fn file_name(&self) -> &Path {
        &self.named.file
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Exported fields in declaration order.
    pub fn fields(&self) -> Vec<Field> {
        let Underlying::Struct(vars) = &self.named.underlying else {
            return Vec::new();
        };
        vars.iter()
            .filter(|v| v.exported)
            .map(|v| Field {
                comment: self.package.comment_for(&self.named.file, v.pos),
                var: v.clone(),
                package: Arc::clone(&self.package),
            })
            .collect()
    }

    /// Exported inherent methods, in method-set order.
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }
}

impl fmt::Debug for Struct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Struct")
            .field("name", &self.qualified_name())
            .field("file", &self.named.file)
            .finish()
    }
}

/// A struct member, parameter or result.
#[derive(Clone)]
pub struct Field {
    var: Var,
    comment: Option<String>,
    package: Arc<LoadedPackage>,
}

impl Field {
    /// Field name; tuple struct fields are `0`, `1`, ...; results are unnamed.
    pub fn name(&self) -> &str {
        &self.var.name
    }

    pub fn ty(&self) -> &Type {
        &self.var.ty
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// The struct this field's type names, directly or behind one pointer.
    pub fn as_struct(&self) -> Option<Struct> {
        let name = self.var.ty.deref_once().local_name()?;
        let named = self.package.package.scope.lookup_struct(name)?;
        Some(Struct::new(Arc::clone(named), Arc::clone(&self.package)))
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.var.name, self.var.ty)
    }
}

#[derive(Clone)]
pub struct Method {
    func: Func,
    comment: Option<String>,
    package: Arc<LoadedPackage>,
}

impl Method {
    fn new(func: Func, package: &Arc<LoadedPackage>) -> Self {
        Self {
            comment: package.comment_for(&func.file, func.pos),
            func,
            package: Arc::clone(package),
        }
    }

    pub fn name(&self) -> &str {
        &self.func.name
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Whether the method takes `self` in some form.
    pub fn has_receiver(&self) -> bool {
        self.func.sig.has_receiver
    }

    pub fn params(&self) -> Vec<Field> {
        self.func.sig.params.iter().map(|v| self.field(v)).collect()
    }

    /// The first declared result; later tuple elements are not reported.
    pub fn returns(&self) -> Option<Field> {
        self.func.sig.results.first().map(|v| self.field(v))
    }

    fn field(&self, var: &Var) -> Field {
        Field {
            var: var.clone(),
            comment: None,
            package: Arc::clone(&self.package),
        }
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.func.name)
            .field("params", &self.params())
            .field("returns", &self.returns())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::testutil::{load, find};

    const GEO: &str = r#"
/// A point.
pub struct Point {
    /// Horizontal.
    pub x: i32,
    pub y: i32,
    hidden: bool,
}

pub struct Line {
    pub start: Point,
    pub end: Box<Point>,
    pub label: Option<Point>,
    pub other: crate::Point,
}

pub struct Pair(pub u8, String, pub Point);

pub type Coord = Point;

pub struct Holder {
    pub at: &'static Coord,
}

impl Point {
    // C1
    pub fn m1(&self) {}
    pub fn m2(&self) {}
    fn private(&self) {}
    /// Split.
    pub fn split(&self, at: i32) -> (Point, Point) {
        (Point { x: at, y: 0, hidden: false }, Point { x: 0, y: 0, hidden: false })
    }
    pub fn origin() -> Self {
        Point { x: 0, y: 0, hidden: false }
    }
}
"#;

    #[test]
    fn exported_fields_only() {
        let (_dir, parser) = load(&[("geo.rs", GEO)]);
        let point = find(&parser, "Point");
        assert_eq!(point.comment(), Some("A point."));
        let fields = point.fields();
        let names: Vec<_> = fields.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["x", "y"]);
        assert_eq!(fields[0].comment(), Some("Horizontal."));
        assert_eq!(fields[1].comment(), None);
        assert_eq!(fields[0].ty().to_string(), "i32");
    }

    #[test]
    fn tuple_struct_fields_are_numbered() {
        let (_dir, parser) = load(&[("geo.rs", GEO)]);
        let names: Vec<String> = find(&parser, "Pair")
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect();
        assert_eq!(names, vec!["0", "2"]);
    }

    #[test]
    fn nested_struct_resolution() {
        let (_dir, parser) = load(&[("geo.rs", GEO)]);
        let line = find(&parser, "Line");
        let resolved: Vec<Option<String>> = line
            .fields()
            .iter()
            .map(|f| f.as_struct().map(|s| s.name().to_string()))
            .collect();
        assert_eq!(
            resolved,
            vec![Some("Point".to_string()), Some("Point".to_string()), None, None]
        );

        let holder = find(&parser, "Holder");
        let at = &holder.fields()[0];
        assert_eq!(at.ty().to_string(), "&'static Coord");
        assert_eq!(at.as_struct().map(|s| s.name().to_string()), Some("Point".to_string()));
    }

    #[test]
    fn self_in_field_types_names_the_struct() {
        let (_dir, parser) = load(&[(
            "node.rs",
            "pub struct Node {\n    pub next: Box<Self>,\n    pub prev: Option<Box<Self>>,\n}\n",
        )]);
        let node = find(&parser, "Node");
        let fields = node.fields();
        assert_eq!(fields[0].ty().to_string(), "Box<Node>");
        assert_eq!(fields[1].ty().to_string(), "Option<Box<Node>>");
        let next = fields[0].as_struct().unwrap();
        assert_eq!(next.name(), "Node");
        assert_eq!(next.fields()[0].ty().to_string(), "Box<Node>");
    }

    #[test]
    fn paths_into_other_modules_stay_leaves() {
        let (_dir, parser) = load(&[(
            "lib.rs",
            "pub struct Point { pub x: i32 }\npub struct Far { pub at: crate::geo::Point, pub near: self::Point }\n",
        )]);
        let far = find(&parser, "Far");
        let fields = far.fields();
        assert!(fields[0].as_struct().is_none());
        assert_eq!(fields[1].as_struct().map(|s| s.name().to_string()), Some("Point".to_string()));
    }

    #[test]
    fn methods_and_comments() {
        let (_dir, parser) = load(&[("geo.rs", GEO)]);
        let point = find(&parser, "Point");
        let methods = point.methods();
        let names: Vec<_> = methods.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["m1", "m2", "split", "origin"]);
        assert_eq!(methods[0].comment(), Some("C1"));
        assert_eq!(methods[1].comment(), None);
        assert_eq!(methods[2].comment(), Some("Split."));

        let split = &methods[2];
        assert!(split.has_receiver());
        assert_eq!(split.params().len(), 1);
        assert_eq!(split.params()[0].name(), "at");
        let ret = split.returns().unwrap();
        assert_eq!(ret.name(), "");
        assert_eq!(ret.ty().to_string(), "Point");

        let origin = &methods[3];
        assert!(!origin.has_receiver());
        assert_eq!(origin.returns().unwrap().ty().to_string(), "Point");
        assert!(methods[0].returns().is_none());
    }

    #[test]
    fn methods_from_sibling_files() {
        let (_dir, parser) = load(&[
            ("a.rs", "pub struct S;\n"),
            ("b.rs", "impl S {\n    /// From b.\n    pub fn b(&self) {}\n}\n"),
        ]);
        let s = find(&parser, "S");
        assert_eq!(s.methods().len(), 1);
        assert_eq!(s.methods()[0].comment(), Some("From b."));
    }
}
