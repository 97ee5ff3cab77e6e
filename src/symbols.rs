use std::collections::{HashMap, HashSet};

use crate::{
    error::{GenerateError, Result},
    naming,
    schema::{package_segments, EnumType, MessageType, SchemaFile},
    well_known::{WellKnownType, WELL_KNOWN_PACKAGE},
};

/// Where a schema type ends up in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub namespace: Vec<String>,
    pub name: String,
}

#[derive(Debug)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
    // (namespace, local name) => whoever took it first
    occupied: HashMap<(Vec<String>, String), String>,
    // every package and package prefix
    namespaces: HashSet<Vec<String>>,
}

impl SymbolTable {
    /// A table holding only the well-known types.
    pub fn new() -> Self {
        let mut table = Self {
            symbols: HashMap::new(),
            occupied: HashMap::new(),
            namespaces: HashSet::new(),
        };

        let namespace = package_segments(WELL_KNOWN_PACKAGE);
        table.add_namespace(&namespace);

        for well_known in WellKnownType::all() {
            table.occupied.insert(
                (namespace.clone(), well_known.name.to_owned()),
                well_known.full_name.clone(),
            );

            table.symbols.insert(
                well_known.full_name,
                Symbol {
                    namespace: namespace.clone(),
                    name: well_known.name.to_owned(),
                },
            );
        }

        table
    }

    /// Registers every type of every file, imports included, so that references
    /// across files resolve no matter which files are being emitted.
    pub fn build(files: &[SchemaFile]) -> Result<Self> {
        let mut table = Self::new();

        for file in files {
            let namespace = file.package_segments();
            table.add_namespace(&namespace);

            for descriptor in &file.enums {
                table.add_enum(descriptor, &namespace, None)?;
            }

            for descriptor in &file.messages {
                table.add_message(descriptor, &namespace, None)?;
            }

            for service in &file.services {
                table.reserve(
                    &namespace,
                    &naming::service_name(&service.name),
                    &service.full_name,
                )?;
            }
        }

        tracing::debug!(symbols = table.symbols.len(), "built symbol table");

        Ok(table)
    }

    pub fn register(&mut self, full_name: &str, namespace: Vec<String>, name: String) -> Result<()> {
        if WellKnownType::try_from_full_name(full_name).is_some() {
            // declared outside the generated files, even when its own file is loaded
            return Ok(());
        }

        if self.symbols.contains_key(full_name) {
            return Err(GenerateError::NameCollision {
                scope: namespace.join("."),
                identifier: name,
                first: full_name.to_owned(),
                second: full_name.to_owned(),
            });
        }

        self.reserve(&namespace, &name, full_name)?;

        self.symbols.insert(
            full_name.to_owned(),
            Symbol { namespace, name },
        );

        Ok(())
    }

    pub fn resolve(&self, full_name: &str, referenced_from: &str) -> Result<&Symbol> {
        let full_name = full_name.strip_prefix('.').unwrap_or(full_name);

        self.symbols
            .get(full_name)
            .ok_or_else(|| GenerateError::UnresolvedReference {
                name: full_name.to_owned(),
                referenced_from: referenced_from.to_owned(),
            })
    }

    /// Resolves a reference written inside the namespace `scope`. Fails when the
    /// reference's first namespace segment would be picked up by an enclosing
    /// namespace instead, e.g. `search.Thing` written inside `acme.search`.
    pub fn resolve_from(
        &self,
        full_name: &str,
        scope: &[String],
        referenced_from: &str,
    ) -> Result<&Symbol> {
        let symbol = self.resolve(full_name, referenced_from)?;

        let Some(first) = symbol.namespace.first() else {
            return Ok(symbol);
        };

        if symbol.namespace == scope {
            return Ok(symbol);
        }

        // innermost enclosing namespace first, as TypeScript looks names up
        for depth in (1..=scope.len()).rev() {
            let enclosing = &scope[..depth];

            if self.has_member(enclosing, first) {
                return Err(GenerateError::ShadowedReference {
                    name: full_name.strip_prefix('.').unwrap_or(full_name).to_owned(),
                    referenced_from: referenced_from.to_owned(),
                    shadowed_by: format!("{}.{first}", enclosing.join(".")),
                });
            }
        }

        Ok(symbol)
    }

    fn has_member(&self, namespace: &[String], name: &str) -> bool {
        let mut child = namespace.to_vec();
        child.push(name.to_owned());

        self.namespaces.contains(&child)
            || self
                .occupied
                .contains_key(&(namespace.to_vec(), name.to_owned()))
    }

    fn add_namespace(&mut self, namespace: &[String]) {
        for depth in 1..=namespace.len() {
            self.namespaces.insert(namespace[..depth].to_vec());
        }
    }

    fn reserve(&mut self, namespace: &[String], name: &str, owner: &str) -> Result<()> {
        let key = (namespace.to_vec(), name.to_owned());

        if let Some(first) = self.occupied.get(&key) {
            return Err(GenerateError::NameCollision {
                scope: namespace.join("."),
                identifier: name.to_owned(),
                first: first.clone(),
                second: owner.to_owned(),
            });
        }

        self.occupied.insert(key, owner.to_owned());
        Ok(())
    }

    fn add_message(
        &mut self,
        descriptor: &MessageType,
        namespace: &[String],
        enclosing: Option<&str>,
    ) -> Result<()> {
        if descriptor.map_entry {
            return Ok(());
        }

        let name = naming::type_name(enclosing, &descriptor.name);
        self.register(&descriptor.full_name, namespace.to_vec(), name.clone())?;

        for nested_type in &descriptor.nested_messages {
            self.add_message(nested_type, namespace, Some(&name))?;
        }

        for nested_enum in &descriptor.nested_enums {
            self.add_enum(nested_enum, namespace, Some(&name))?;
        }

        Ok(())
    }

    fn add_enum(
        &mut self,
        descriptor: &EnumType,
        namespace: &[String],
        enclosing: Option<&str>,
    ) -> Result<()> {
        self.register(
            &descriptor.full_name,
            namespace.to_vec(),
            naming::type_name(enclosing, &descriptor.name),
        )
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
