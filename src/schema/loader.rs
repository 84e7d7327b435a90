//! XSD schema loading and compilation.
//!
//! The schema document goes through the same XML parser as the inputs it
//! later validates, then gets compiled into the flat [`Schema`] tables.
//! Compilation resolves every type reference eagerly, so a broken schema
//! fails at validator construction instead of mid-validation.
//!
//! The supported XSD subset is the one the bundled OME schema uses: global
//! elements, named and anonymous complex types with `sequence` content
//! models, attributes, `simpleContent` extensions, and simple types
//! restricted by enumeration.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::error::{IoError, SchemaError};
use crate::xml::{self, Document, NodeId};

use super::model::{
    AttributeDecl, BuiltInType, ComplexType, ElementDecl, Particle, Schema, SimpleType,
    SimpleTypeRef, TypeRef,
};

/// The OME schema compiled into the binary.
const BUNDLED_SCHEMA: &str = include_str!("../../schema/ome.xsd");

static BUNDLED: OnceLock<Result<Arc<Schema>, SchemaError>> = OnceLock::new();

/// The bundled OME schema, compiled once per process.
pub fn bundled() -> Result<Arc<Schema>, SchemaError> {
    BUNDLED
        .get_or_init(|| from_str(BUNDLED_SCHEMA).map(Arc::new))
        .clone()
}

/// Compile a schema from XSD text.
pub fn from_str(text: &str) -> Result<Schema, SchemaError> {
    let doc = xml::parse(text)?;
    compile(&doc)
}

/// Read and compile a schema file.
pub fn from_file(path: &Path) -> Result<Schema, SchemaError> {
    let bytes = std::fs::read(path).map_err(|e| IoError::from_std(path, &e))?;
    let text = xml::decode_text(&bytes)?;
    let schema = from_str(&text)?;
    debug!(path = %path.display(), elements = schema.elements.len(), "loaded schema");
    Ok(schema)
}

/// Compile a parsed XSD document into a [`Schema`].
pub fn compile(doc: &Document) -> Result<Schema, SchemaError> {
    let root = doc.root();
    let root_name = doc
        .element(root)
        .map(|e| e.name.local.clone())
        .unwrap_or_default();
    if root_name != "schema" {
        return Err(SchemaError::NotASchema(root_name));
    }

    let target_namespace = doc
        .attribute(root, "targetNamespace")
        .ok_or(SchemaError::MissingTargetNamespace)?
        .to_string();

    // Pre-scan declared type names so references resolve regardless of
    // declaration order.
    let mut declared_simple = std::collections::HashSet::new();
    let mut declared_complex = std::collections::HashSet::new();
    for child in doc.child_elements(root) {
        if let (Some(element), Some(name)) = (doc.element(child), doc.attribute(child, "name")) {
            match element.name.local.as_str() {
                "simpleType" => {
                    declared_simple.insert(name.to_string());
                }
                "complexType" => {
                    declared_complex.insert(name.to_string());
                }
                _ => {}
            }
        }
    }

    let mut compiler = Compiler {
        doc,
        declared_simple,
        declared_complex,
        schema: Schema {
            target_namespace,
            elements: Default::default(),
            complex_types: Default::default(),
            simple_types: Default::default(),
        },
    };

    for child in doc.child_elements(root) {
        let local = compiler.local_name(child);
        match local.as_str() {
            "element" => {
                let name = compiler.required_attr(child, "element", "name")?;
                let type_ref = compiler.element_type(child, &name)?;
                compiler
                    .schema
                    .elements
                    .insert(name.clone(), ElementDecl { name, type_ref });
            }
            "complexType" => {
                let name = compiler.required_attr(child, "complexType", "name")?;
                let compiled = compiler.compile_complex_type(child, &name)?;
                compiler.schema.complex_types.insert(name, compiled);
            }
            "simpleType" => {
                let name = compiler.required_attr(child, "simpleType", "name")?;
                let compiled = compiler.compile_simple_type(child)?;
                compiler.schema.simple_types.insert(name, compiled);
            }
            // annotations, imports etc. are skipped
            _ => {}
        }
    }

    compiler.check_references()?;
    Ok(compiler.schema)
}

// =============================================================================
// Compiler
// =============================================================================

struct Compiler<'a> {
    doc: &'a Document,
    declared_simple: std::collections::HashSet<String>,
    declared_complex: std::collections::HashSet<String>,
    schema: Schema,
}

impl<'a> Compiler<'a> {
    fn local_name(&self, id: NodeId) -> String {
        self.doc
            .element(id)
            .map(|e| e.name.local.clone())
            .unwrap_or_default()
    }

    fn required_attr(
        &self,
        id: NodeId,
        element: &'static str,
        attribute: &'static str,
    ) -> Result<String, SchemaError> {
        self.doc
            .attribute(id, attribute)
            .map(str::to_string)
            .ok_or(SchemaError::MissingAttribute { element, attribute })
    }

    fn find_child(&self, id: NodeId, local: &str) -> Option<NodeId> {
        self.doc
            .child_elements(id)
            .find(|&c| self.local_name(c) == local)
    }

    /// Resolve the type of an element declaration: a `type` attribute, an
    /// inline `complexType`, an inline `simpleType`, or (absent all of
    /// those) plain string content.
    fn element_type(&mut self, id: NodeId, context: &str) -> Result<TypeRef, SchemaError> {
        if let Some(type_name) = self.doc.attribute(id, "type") {
            return Ok(self.named_type_ref(type_name));
        }

        if let Some(inline) = self.find_child(id, "complexType") {
            // Anonymous type, keyed by the element that declares it.
            let key = format!("{}#type", context);
            let compiled = self.compile_complex_type(inline, &key)?;
            self.schema.complex_types.insert(key.clone(), compiled);
            return Ok(TypeRef::Complex(key));
        }

        if let Some(inline) = self.find_child(id, "simpleType") {
            let key = format!("{}#type", context);
            let compiled = self.compile_simple_type(inline)?;
            self.schema.simple_types.insert(key.clone(), compiled);
            return Ok(TypeRef::Simple(SimpleTypeRef::Named(key)));
        }

        Ok(TypeRef::Simple(SimpleTypeRef::BuiltIn(BuiltInType::String)))
    }

    /// Interpret a `type="..."` reference: built-ins resolve immediately,
    /// anything else becomes a named reference checked after compilation.
    fn named_type_ref(&self, type_name: &str) -> TypeRef {
        if let Some(builtin) = BuiltInType::from_xsd_name(type_name) {
            // A schema-defined type shadows a built-in of the same
            // unprefixed name.
            let is_schema_local = !type_name.contains(':')
                && (self.declared_simple.contains(type_name)
                    || self.declared_complex.contains(type_name));
            if !is_schema_local {
                return TypeRef::Simple(SimpleTypeRef::BuiltIn(builtin));
            }
        }
        let local = type_name
            .split_once(':')
            .map_or(type_name, |(_, local)| local)
            .to_string();
        if self.declared_simple.contains(&local) {
            TypeRef::Simple(SimpleTypeRef::Named(local))
        } else {
            TypeRef::Complex(local)
        }
    }

    fn compile_complex_type(
        &mut self,
        id: NodeId,
        context: &str,
    ) -> Result<ComplexType, SchemaError> {
        let mut compiled = ComplexType::default();

        if let Some(simple_content) = self.find_child(id, "simpleContent") {
            let extension = self
                .find_child(simple_content, "extension")
                .ok_or(SchemaError::MissingAttribute {
                    element: "simpleContent",
                    attribute: "base",
                })?;
            let base = self.required_attr(extension, "extension", "base")?;
            compiled.text = Some(self.simple_ref(&base));
            for attr in self.collect_attributes(extension, context)? {
                compiled.attributes.push(attr);
            }
            return Ok(compiled);
        }

        if let Some(sequence) = self.find_child(id, "sequence") {
            let particle_ids: Vec<NodeId> = self
                .doc
                .child_elements(sequence)
                .filter(|&c| self.local_name(c) == "element")
                .collect();
            for particle in particle_ids {
                let name = self.required_attr(particle, "element", "name")?;
                let child_context = format!("{}.{}", context, name);
                let type_ref = self.element_type(particle, &child_context)?;
                compiled.particles.push(Particle {
                    element: name,
                    type_ref,
                    min_occurs: self.occurs_attr(particle, "minOccurs", 1),
                    max_occurs: self.max_occurs_attr(particle),
                });
            }
        }

        for attr in self.collect_attributes(id, context)? {
            compiled.attributes.push(attr);
        }
        Ok(compiled)
    }

    fn collect_attributes(
        &mut self,
        id: NodeId,
        context: &str,
    ) -> Result<Vec<AttributeDecl>, SchemaError> {
        let attr_ids: Vec<NodeId> = self
            .doc
            .child_elements(id)
            .filter(|&c| self.local_name(c) == "attribute")
            .collect();

        let mut attrs = Vec::with_capacity(attr_ids.len());
        for attr_id in attr_ids {
            let name = self.required_attr(attr_id, "attribute", "name")?;
            let required = self.doc.attribute(attr_id, "use") == Some("required");

            let ty = if let Some(type_name) = self.doc.attribute(attr_id, "type") {
                self.simple_ref(type_name)
            } else if let Some(inline) = self.find_child(attr_id, "simpleType") {
                let key = format!("{}@{}", context, name);
                let compiled = self.compile_simple_type(inline)?;
                self.schema.simple_types.insert(key.clone(), compiled);
                SimpleTypeRef::Named(key)
            } else {
                SimpleTypeRef::BuiltIn(BuiltInType::String)
            };

            attrs.push(AttributeDecl { name, ty, required });
        }
        Ok(attrs)
    }

    fn simple_ref(&self, type_name: &str) -> SimpleTypeRef {
        let local = type_name.split_once(':').map_or(type_name, |(_, l)| l);
        if !self.declared_simple.contains(local) {
            if let Some(builtin) = BuiltInType::from_xsd_name(type_name) {
                return SimpleTypeRef::BuiltIn(builtin);
            }
        }
        SimpleTypeRef::Named(local.to_string())
    }

    fn compile_simple_type(&self, id: NodeId) -> Result<SimpleType, SchemaError> {
        let restriction = self
            .find_child(id, "restriction")
            .ok_or(SchemaError::MissingAttribute {
                element: "simpleType",
                attribute: "restriction",
            })?;
        let base_name = self.required_attr(restriction, "restriction", "base")?;
        let base = BuiltInType::from_xsd_name(&base_name)
            .ok_or_else(|| SchemaError::UnknownType(base_name.clone()))?;

        let enumeration = self
            .doc
            .child_elements(restriction)
            .filter(|&c| self.local_name(c) == "enumeration")
            .filter_map(|c| self.doc.attribute(c, "value").map(str::to_string))
            .collect();

        Ok(SimpleType { base, enumeration })
    }

    fn occurs_attr(&self, id: NodeId, name: &str, default: u32) -> u32 {
        self.doc
            .attribute(id, name)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn max_occurs_attr(&self, id: NodeId) -> Option<u32> {
        match self.doc.attribute(id, "maxOccurs") {
            Some("unbounded") => None,
            Some(v) => Some(v.parse().unwrap_or(1)),
            None => Some(1),
        }
    }

    /// Reject dangling named references so validation never meets one.
    fn check_references(&self) -> Result<(), SchemaError> {
        let mut pending: Vec<&TypeRef> = Vec::new();
        for decl in self.schema.elements.values() {
            pending.push(&decl.type_ref);
        }
        for ty in self.schema.complex_types.values() {
            for particle in &ty.particles {
                pending.push(&particle.type_ref);
            }
        }

        for type_ref in pending {
            match type_ref {
                TypeRef::Complex(name) => {
                    if !self.schema.complex_types.contains_key(name) {
                        return Err(SchemaError::UnknownType(name.clone()));
                    }
                }
                TypeRef::Simple(SimpleTypeRef::Named(name)) => {
                    if !self.schema.simple_types.contains_key(name) {
                        return Err(SchemaError::UnknownType(name.clone()));
                    }
                }
                TypeRef::Simple(SimpleTypeRef::BuiltIn(_)) => {}
            }
        }

        for ty in self.schema.complex_types.values() {
            for attr in ty
                .attributes
                .iter()
                .map(|a| &a.ty)
                .chain(ty.text.iter())
            {
                if let SimpleTypeRef::Named(name) = attr {
                    if !self.schema.simple_types.contains_key(name) {
                        return Err(SchemaError::UnknownType(name.clone()));
                    }
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
