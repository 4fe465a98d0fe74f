//! SHACL validation of the data graph against the shapes graph.
//!
//! Implements the constraint components the kernel needs: cardinality
//! (`sh:minCount`/`sh:maxCount`), value typing (`sh:datatype`, `sh:class`),
//! string facets (`sh:pattern`, `sh:minLength`, `sh:maxLength`), numeric
//! ranges (`sh:minInclusive`, `sh:maxInclusive`), enumerations (`sh:in`)
//! and `sh:uniqueLang`. Targets are resolved through `sh:targetClass`,
//! `sh:targetNode`, `sh:targetSubjectsOf` and `sh:targetObjectsOf`.
//!
//! Under [`InferenceMode::Rdfs`], class targeting and `sh:class` checks
//! follow the `rdfs:subClassOf` closure of both graphs.

use std::collections::{HashMap, HashSet};

use anyhow::Context as _;
use oxigraph::model::{NamedNode, NamedOrBlankNode, SubjectRef, Term};
use oxigraph::store::Store;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{KernelError, Result};

const SH_NS: &str = "http://www.w3.org/ns/shacl#";
const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";

/// Inference applied before target and class matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum InferenceMode {
    #[default]
    Rdfs,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Violation,
}

impl Severity {
    fn from_iri(iri: &str) -> Self {
        match iri {
            "http://www.w3.org/ns/shacl#Info" => Severity::Info,
            "http://www.w3.org/ns/shacl#Warning" => Severity::Warning,
            _ => Severity::Violation,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Violation => "Violation",
        }
    }
}

/// One constraint check outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub focus_node: String,
    pub path: Option<String>,
    pub value: Option<String>,
    pub message: String,
    pub severity: Severity,
    pub source_shape: String,
    pub constraint: &'static str,
}

/// Conformance flag plus every recorded result.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    results: Vec<ValidationResult>,
    conforms: bool,
}

impl ValidationReport {
    fn new() -> Self {
        Self {
            results: Vec::new(),
            conforms: true,
        }
    }

    fn push(&mut self, result: ValidationResult) {
        if result.severity == Severity::Violation {
            self.conforms = false;
        }
        self.results.push(result);
    }

    pub fn conforms(&self) -> bool {
        self.conforms
    }

    pub fn results(&self) -> &[ValidationResult] {
        &self.results
    }

    /// Human-readable diagnostic text, pyshacl-like.
    pub fn text(&self) -> String {
        let mut out = String::from("Validation Report\n");
        out.push_str(&format!(
            "Conforms: {}\n",
            if self.conforms { "True" } else { "False" }
        ));
        if self.results.is_empty() {
            return out;
        }
        out.push_str(&format!("Results ({}):\n", self.results.len()));
        for result in &self.results {
            out.push_str(&format!(
                "Constraint {} in {}:\n",
                result.severity.label(),
                result.constraint
            ));
            out.push_str(&format!("  Focus Node: {}\n", result.focus_node));
            if let Some(path) = &result.path {
                out.push_str(&format!("  Result Path: {path}\n"));
            }
            if let Some(value) = &result.value {
                out.push_str(&format!("  Value: {value}\n"));
            }
            out.push_str(&format!("  Source Shape: {}\n", result.source_shape));
            out.push_str(&format!("  Message: {}\n", result.message));
        }
        out
    }
}

#[derive(Debug, Clone)]
struct PropertyConstraint {
    path: NamedNode,
    min_count: Option<u64>,
    max_count: Option<u64>,
    datatype: Option<NamedNode>,
    class: Option<NamedNode>,
    pattern: Option<String>,
    min_length: Option<u64>,
    max_length: Option<u64>,
    min_inclusive: Option<f64>,
    max_inclusive: Option<f64>,
    in_values: Vec<Term>,
    unique_lang: bool,
    message: Option<String>,
}

#[derive(Debug, Clone)]
struct Shape {
    id: NamedNode,
    target_class: Option<NamedNode>,
    target_nodes: Vec<NamedNode>,
    target_subjects_of: Vec<NamedNode>,
    target_objects_of: Vec<NamedNode>,
    severity: Severity,
    constraints: Vec<PropertyConstraint>,
}

/// Validates a data store against the node shapes found in a shapes store.
pub struct ShapeValidator<'a> {
    shapes: &'a Store,
}

impl<'a> ShapeValidator<'a> {
    pub fn new(shapes: &'a Store) -> Self {
        Self { shapes }
    }

    pub fn validate(&self, data: &Store, inference: InferenceMode) -> Result<ValidationReport> {
        let shapes = self.load_shapes()?;
        let types = TypeIndex::build(data, self.shapes, inference)?;
        let mut report = ValidationReport::new();

        for shape in &shapes {
            for focus in self.focus_nodes(shape, data, &types)? {
                for constraint in &shape.constraints {
                    for mut result in check_constraint(data, &focus, constraint, shape, &types)? {
                        if shape.severity != Severity::Violation {
                            result.severity = shape.severity;
                        }
                        report.push(result);
                    }
                }
            }
        }
        Ok(report)
    }

    fn focus_nodes(
        &self,
        shape: &Shape,
        data: &Store,
        types: &TypeIndex,
    ) -> Result<Vec<NamedNode>> {
        let mut seen = HashSet::new();
        let mut nodes = Vec::new();
        let mut add = |node: NamedNode| {
            if seen.insert(node.clone()) {
                nodes.push(node);
            }
        };

        for node in &shape.target_nodes {
            add(node.clone());
        }
        if let Some(class) = &shape.target_class {
            for node in types.instances_of(class) {
                add(node);
            }
        }
        for predicate in &shape.target_subjects_of {
            for quad in data.quads_for_pattern(None, Some(predicate.as_ref().into()), None, None) {
                if let NamedOrBlankNode::NamedNode(node) = quad?.subject {
                    add(node);
                }
            }
        }
        for predicate in &shape.target_objects_of {
            for quad in data.quads_for_pattern(None, Some(predicate.as_ref().into()), None, None) {
                if let Term::NamedNode(node) = quad?.object {
                    add(node);
                }
            }
        }
        Ok(nodes)
    }

    fn load_shapes(&self) -> Result<Vec<Shape>> {
        let rdf_type = sh_node(RDF_NS, "type");
        let node_shape = sh_node(SH_NS, "NodeShape");
        let mut shapes = Vec::new();

        for quad in self.shapes.quads_for_pattern(
            None,
            Some(rdf_type.as_ref().into()),
            Some(node_shape.as_ref().into()),
            None,
        ) {
            if let NamedOrBlankNode::NamedNode(id) = quad?.subject {
                shapes.push(self.load_shape(id)?);
            }
        }
        Ok(shapes)
    }

    fn load_shape(&self, id: NamedNode) -> Result<Shape> {
        let subject = id.as_ref().into();
        let severity = self
            .named_object(subject, "severity")?
            .map(|iri| Severity::from_iri(iri.as_str()))
            .unwrap_or(Severity::Violation);

        let mut constraints = Vec::new();
        for term in self.objects(subject, &sh_node(SH_NS, "property"))? {
            if let Some(prop_subject) = term_as_subject(&term) {
                if let Some(constraint) = self.load_constraint(prop_subject)? {
                    constraints.push(constraint);
                }
            }
        }

        Ok(Shape {
            target_class: self.named_object(subject, "targetClass")?,
            target_nodes: self.named_objects(subject, "targetNode")?,
            target_subjects_of: self.named_objects(subject, "targetSubjectsOf")?,
            target_objects_of: self.named_objects(subject, "targetObjectsOf")?,
            severity,
            constraints,
            id,
        })
    }

    fn load_constraint(&self, subject: SubjectRef<'_>) -> Result<Option<PropertyConstraint>> {
        let path = match self.named_object(subject, "path")? {
            Some(path) => path,
            // Complex path expressions (inverse, sequence) are not supported.
            None => return Ok(None),
        };

        let in_values = match self.object(subject, &sh_node(SH_NS, "in"))? {
            Some(head) => self.collect_list(head)?,
            None => Vec::new(),
        };

        Ok(Some(PropertyConstraint {
            path,
            min_count: self.integer_object(subject, "minCount")?,
            max_count: self.integer_object(subject, "maxCount")?,
            datatype: self.named_object(subject, "datatype")?,
            class: self.named_object(subject, "class")?,
            pattern: self.string_object(subject, "pattern")?,
            min_length: self.integer_object(subject, "minLength")?,
            max_length: self.integer_object(subject, "maxLength")?,
            min_inclusive: self.float_object(subject, "minInclusive")?,
            max_inclusive: self.float_object(subject, "maxInclusive")?,
            unique_lang: self
                .string_object(subject, "uniqueLang")?
                .is_some_and(|flag| flag == "true"),
            message: self.string_object(subject, "message")?,
            in_values,
        }))
    }

    fn collect_list(&self, head: Term) -> Result<Vec<Term>> {
        let first = sh_node(RDF_NS, "first");
        let rest = sh_node(RDF_NS, "rest");
        let nil = format!("{RDF_NS}nil");
        let mut values = Vec::new();
        let mut current = head;

        loop {
            if let Term::NamedNode(node) = &current {
                if node.as_str() == nil {
                    break;
                }
            }
            let cell = match term_as_subject(&current) {
                Some(subject) => subject,
                None => break,
            };
            if let Some(value) = self.object(cell, &first)? {
                values.push(value);
            }
            match self.object(cell, &rest)? {
                Some(next) => current = next,
                None => break,
            }
        }
        Ok(values)
    }

    fn object(&self, subject: SubjectRef<'_>, predicate: &NamedNode) -> Result<Option<Term>> {
        for quad in
            self.shapes
                .quads_for_pattern(Some(subject), Some(predicate.as_ref().into()), None, None)
        {
            return Ok(Some(quad?.object));
        }
        Ok(None)
    }

    fn objects(&self, subject: SubjectRef<'_>, predicate: &NamedNode) -> Result<Vec<Term>> {
        let mut terms = Vec::new();
        for quad in
            self.shapes
                .quads_for_pattern(Some(subject), Some(predicate.as_ref().into()), None, None)
        {
            terms.push(quad?.object);
        }
        Ok(terms)
    }

    fn named_object(&self, subject: SubjectRef<'_>, local: &str) -> Result<Option<NamedNode>> {
        match self.object(subject, &sh_node(SH_NS, local))? {
            Some(Term::NamedNode(node)) => Ok(Some(node)),
            _ => Ok(None),
        }
    }

    fn named_objects(&self, subject: SubjectRef<'_>, local: &str) -> Result<Vec<NamedNode>> {
        Ok(self
            .objects(subject, &sh_node(SH_NS, local))?
            .into_iter()
            .filter_map(|term| match term {
                Term::NamedNode(node) => Some(node),
                _ => None,
            })
            .collect())
    }

    fn string_object(&self, subject: SubjectRef<'_>, local: &str) -> Result<Option<String>> {
        match self.object(subject, &sh_node(SH_NS, local))? {
            Some(Term::Literal(lit)) => Ok(Some(lit.value().to_string())),
            _ => Ok(None),
        }
    }

    fn integer_object(&self, subject: SubjectRef<'_>, local: &str) -> Result<Option<u64>> {
        match self.string_object(subject, local)? {
            Some(raw) => {
                let parsed = raw
                    .parse::<u64>()
                    .with_context(|| format!("sh:{local} is not an integer: {raw}"))
                    .map_err(KernelError::Internal)?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    fn float_object(&self, subject: SubjectRef<'_>, local: &str) -> Result<Option<f64>> {
        match self.string_object(subject, local)? {
            Some(raw) => {
                let parsed = raw
                    .parse::<f64>()
                    .with_context(|| format!("sh:{local} is not numeric: {raw}"))
                    .map_err(KernelError::Internal)?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }
}

/// rdf:type facts of the data graph, optionally widened by the
/// rdfs:subClassOf closure of both graphs.
struct TypeIndex {
    /// node IRI -> all classes it belongs to (closure applied).
    types: HashMap<String, HashSet<String>>,
}

impl TypeIndex {
    fn build(data: &Store, shapes: &Store, inference: InferenceMode) -> Result<Self> {
        let rdf_type = sh_node(RDF_NS, "type");
        let sub_class_of = sh_node(RDFS_NS, "subClassOf");

        let mut supers: HashMap<String, HashSet<String>> = HashMap::new();
        if inference == InferenceMode::Rdfs {
            for store in [data, shapes] {
                for quad in
                    store.quads_for_pattern(None, Some(sub_class_of.as_ref().into()), None, None)
                {
                    let quad = quad?;
                    if let (NamedOrBlankNode::NamedNode(sub), Term::NamedNode(sup)) =
                        (quad.subject, quad.object)
                    {
                        supers
                            .entry(sub.as_str().to_string())
                            .or_default()
                            .insert(sup.as_str().to_string());
                    }
                }
            }
            transitive_closure(&mut supers);
        }

        let mut types: HashMap<String, HashSet<String>> = HashMap::new();
        for quad in data.quads_for_pattern(None, Some(rdf_type.as_ref().into()), None, None) {
            let quad = quad?;
            if let (NamedOrBlankNode::NamedNode(node), Term::NamedNode(class)) =
                (quad.subject, quad.object)
            {
                let entry = types.entry(node.as_str().to_string()).or_default();
                if let Some(ancestors) = supers.get(class.as_str()) {
                    entry.extend(ancestors.iter().cloned());
                }
                entry.insert(class.as_str().to_string());
            }
        }
        Ok(Self { types })
    }

    fn instances_of(&self, class: &NamedNode) -> Vec<NamedNode> {
        self.types
            .iter()
            .filter(|(_, classes)| classes.contains(class.as_str()))
            .map(|(iri, _)| NamedNode::new_unchecked(iri.clone()))
            .collect()
    }

    fn has_type(&self, node: &NamedNode, class: &NamedNode) -> bool {
        self.types
            .get(node.as_str())
            .is_some_and(|classes| classes.contains(class.as_str()))
    }
}

fn transitive_closure(supers: &mut HashMap<String, HashSet<String>>) {
    loop {
        let mut additions: Vec<(String, String)> = Vec::new();
        for (sub, parents) in supers.iter() {
            for parent in parents {
                if let Some(grandparents) = supers.get(parent) {
                    for grand in grandparents {
                        if !parents.contains(grand) {
                            additions.push((sub.clone(), grand.clone()));
                        }
                    }
                }
            }
        }
        if additions.is_empty() {
            break;
        }
        for (sub, ancestor) in additions {
            supers.entry(sub).or_default().insert(ancestor);
        }
    }
}

fn check_constraint(
    data: &Store,
    focus: &NamedNode,
    constraint: &PropertyConstraint,
    shape: &Shape,
    types: &TypeIndex,
) -> Result<Vec<ValidationResult>> {
    let mut results = Vec::new();
    let values = property_values(data, focus, &constraint.path)?;

    let mut record = |message: String, value: Option<String>, component: &'static str| {
        results.push(ValidationResult {
            focus_node: focus.to_string(),
            path: Some(constraint.path.to_string()),
            value,
            message: constraint.message.clone().unwrap_or(message),
            severity: Severity::Violation,
            source_shape: shape.id.to_string(),
            constraint: component,
        });
    };

    if let Some(min) = constraint.min_count {
        if (values.len() as u64) < min {
            record(
                format!("Property {} must have at least {min} value(s)", constraint.path),
                None,
                "sh:minCount",
            );
        }
    }
    if let Some(max) = constraint.max_count {
        if (values.len() as u64) > max {
            record(
                format!("Property {} must have at most {max} value(s)", constraint.path),
                None,
                "sh:maxCount",
            );
        }
    }

    for value in &values {
        if let Some(datatype) = &constraint.datatype {
            let matches = match value {
                Term::Literal(lit) => lit.datatype() == datatype.as_ref(),
                _ => false,
            };
            if !matches {
                record(
                    format!("Value must be a literal with datatype {datatype}"),
                    Some(value.to_string()),
                    "sh:datatype",
                );
            }
        }

        if let Some(class) = &constraint.class {
            let matches = match value {
                Term::NamedNode(node) => types.has_type(node, class),
                _ => false,
            };
            if !matches {
                record(
                    format!("Value must be an instance of {class}"),
                    Some(value.to_string()),
                    "sh:class",
                );
            }
        }

        if let Term::Literal(lit) = value {
            let text = lit.value();

            if let Some(pattern) = &constraint.pattern {
                let regex = Regex::new(pattern)
                    .with_context(|| format!("invalid sh:pattern: {pattern}"))
                    .map_err(KernelError::Internal)?;
                if !regex.is_match(text) {
                    record(
                        format!("Value must match pattern {pattern}"),
                        Some(value.to_string()),
                        "sh:pattern",
                    );
                }
            }
            if let Some(min) = constraint.min_length {
                if (text.chars().count() as u64) < min {
                    record(
                        format!("Value must have at least {min} characters"),
                        Some(value.to_string()),
                        "sh:minLength",
                    );
                }
            }
            if let Some(max) = constraint.max_length {
                if (text.chars().count() as u64) > max {
                    record(
                        format!("Value must have at most {max} characters"),
                        Some(value.to_string()),
                        "sh:maxLength",
                    );
                }
            }
            if let Some(min) = constraint.min_inclusive {
                if text.parse::<f64>().map(|n| n < min).unwrap_or(true) {
                    record(
                        format!("Value must be >= {min}"),
                        Some(value.to_string()),
                        "sh:minInclusive",
                    );
                }
            }
            if let Some(max) = constraint.max_inclusive {
                if text.parse::<f64>().map(|n| n > max).unwrap_or(true) {
                    record(
                        format!("Value must be <= {max}"),
                        Some(value.to_string()),
                        "sh:maxInclusive",
                    );
                }
            }
        }

        if !constraint.in_values.is_empty() && !constraint.in_values.contains(value) {
            let allowed = constraint
                .in_values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            record(
                format!("Value must be one of: {allowed}"),
                Some(value.to_string()),
                "sh:in",
            );
        }
    }

    if constraint.unique_lang {
        let mut seen = HashSet::new();
        for value in &values {
            if let Term::Literal(lit) = value {
                if let Some(lang) = lit.language() {
                    if !seen.insert(lang.to_string()) {
                        record(
                            "Property must have at most one value per language tag".to_string(),
                            Some(value.to_string()),
                            "sh:uniqueLang",
                        );
                    }
                }
            }
        }
    }

    Ok(results)
}

fn property_values(data: &Store, focus: &NamedNode, path: &NamedNode) -> Result<Vec<Term>> {
    let mut values = Vec::new();
    for quad in data.quads_for_pattern(
        Some(focus.as_ref().into()),
        Some(path.as_ref().into()),
        None,
        None,
    ) {
        values.push(quad?.object);
    }
    Ok(values)
}

fn term_as_subject(term: &Term) -> Option<SubjectRef<'_>> {
    match term {
        Term::NamedNode(node) => Some(node.as_ref().into()),
        Term::BlankNode(node) => Some(node.as_ref().into()),
        _ => None,
    }
}

fn sh_node(ns: &str, local: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("{ns}{local}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigraph::io::RdfFormat;

    const SHAPES: &str = r#"
        @prefix sh: <http://www.w3.org/ns/shacl#> .
        @prefix ex: <http://example.org/> .
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

        ex:PersonShape a sh:NodeShape ;
            sh:targetClass ex:Person ;
            sh:property [
                sh:path ex:name ;
                sh:minCount 1 ;
                sh:datatype xsd:string ;
                sh:minLength 2 ;
            ] ;
            sh:property [
                sh:path ex:age ;
                sh:maxCount 1 ;
                sh:minInclusive 0 ;
                sh:maxInclusive 150 ;
            ] .
    "#;

    fn store_from(turtle: &str) -> Store {
        let store = Store::new().unwrap();
        store
            .load_from_reader(RdfFormat::Turtle, turtle.as_bytes())
            .unwrap();
        store
    }

    #[test]
    fn conforming_data_passes() {
        let shapes = store_from(SHAPES);
        let data = store_from(
            r#"
            @prefix ex: <http://example.org/> .
            @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
            ex:alice a ex:Person ;
                ex:name "Alice"^^xsd:string ;
                ex:age 30 .
        "#,
        );
        let report = ShapeValidator::new(&shapes)
            .validate(&data, InferenceMode::None)
            .unwrap();
        assert!(report.conforms(), "unexpected report: {}", report.text());
    }

    #[test]
    fn missing_required_property_is_a_violation() {
        let shapes = store_from(SHAPES);
        let data = store_from(
            r#"
            @prefix ex: <http://example.org/> .
            ex:bob a ex:Person .
        "#,
        );
        let report = ShapeValidator::new(&shapes)
            .validate(&data, InferenceMode::None)
            .unwrap();
        assert!(!report.conforms());
        assert!(
            report
                .results()
                .iter()
                .any(|r| r.constraint == "sh:minCount")
        );
        assert!(report.text().contains("Conforms: False"));
    }

    #[test]
    fn out_of_range_age_is_a_violation() {
        let shapes = store_from(SHAPES);
        let data = store_from(
            r#"
            @prefix ex: <http://example.org/> .
            @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
            ex:old a ex:Person ;
                ex:name "Methuselah"^^xsd:string ;
                ex:age 969 .
        "#,
        );
        let report = ShapeValidator::new(&shapes)
            .validate(&data, InferenceMode::None)
            .unwrap();
        assert!(!report.conforms());
        assert!(
            report
                .results()
                .iter()
                .any(|r| r.constraint == "sh:maxInclusive")
        );
    }

    #[test]
    fn rdfs_inference_widens_target_class() {
        let shapes = store_from(SHAPES);
        let data = store_from(
            r#"
            @prefix ex: <http://example.org/> .
            @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
            ex:Employee rdfs:subClassOf ex:Person .
            ex:carol a ex:Employee .
        "#,
        );
        let plain = ShapeValidator::new(&shapes)
            .validate(&data, InferenceMode::None)
            .unwrap();
        assert!(plain.conforms(), "no target match without inference");

        let inferred = ShapeValidator::new(&shapes)
            .validate(&data, InferenceMode::Rdfs)
            .unwrap();
        assert!(!inferred.conforms(), "subclass instance must be targeted");
    }

    #[test]
    fn shape_level_severity_downgrades_results() {
        let shapes = store_from(
            r#"
            @prefix sh: <http://www.w3.org/ns/shacl#> .
            @prefix ex: <http://example.org/> .
            ex:SoftShape a sh:NodeShape ;
                sh:targetClass ex:Thing ;
                sh:severity sh:Warning ;
                sh:property [ sh:path ex:label ; sh:minCount 1 ] .
        "#,
        );
        let data = store_from(
            r#"
            @prefix ex: <http://example.org/> .
            ex:x a ex:Thing .
        "#,
        );
        let report = ShapeValidator::new(&shapes)
            .validate(&data, InferenceMode::None)
            .unwrap();
        // Warnings do not break conformance.
        assert!(report.conforms());
        assert_eq!(report.results().len(), 1);
        assert_eq!(report.results()[0].severity, Severity::Warning);
    }
}
