// In-memory tool catalog with category indexing

use crate::error::McpError;
use crate::types::Tool;
use std::collections::{HashMap, HashSet};

/// In-memory catalog of tool definitions.
///
/// Holds no execution state; the server layers handlers on top. Every
/// registered name belongs to exactly one category bucket at all times.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
    by_category: HashMap<String, HashSet<String>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool, rejecting duplicates.
    pub fn register(&mut self, tool: Tool) -> Result<(), McpError> {
        validate_tool(&tool)?;

        if self.tools.contains_key(&tool.name) {
            return Err(McpError::invalid_request(format!(
                "Tool already registered: {}",
                tool.name
            )));
        }

        self.index_category(&tool);
        self.tools.insert(tool.name.clone(), tool);
        Ok(())
    }

    /// Register or replace a tool, moving its category membership if the
    /// replacement lives in a different category.
    pub fn set(&mut self, tool: Tool) -> Result<(), McpError> {
        validate_tool(&tool)?;

        if let Some(existing) = self.tools.get(&tool.name) {
            let old_category = existing.effective_category().to_string();
            self.drop_from_category(&old_category, &tool.name);
        }

        self.index_category(&tool);
        self.tools.insert(tool.name.clone(), tool);
        Ok(())
    }

    /// Remove a tool from the name map and its category bucket.
    ///
    /// Returns whether anything was removed.
    pub fn unregister(&mut self, name: &str) -> bool {
        match self.tools.remove(name) {
            Some(tool) => {
                let category = tool.effective_category().to_string();
                self.drop_from_category(&category, name);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn list(&self) -> Vec<Tool> {
        self.tools.values().cloned().collect()
    }

    pub fn list_by_category(&self, category: &str) -> Vec<Tool> {
        match self.by_category.get(category) {
            Some(names) => names
                .iter()
                .filter_map(|name| self.tools.get(name))
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn categories(&self) -> Vec<String> {
        self.by_category.keys().cloned().collect()
    }

    /// Case-insensitive substring match against name or description.
    pub fn search(&self, query: &str) -> Vec<Tool> {
        let query = query.to_lowercase();
        self.tools
            .values()
            .filter(|tool| {
                tool.name.to_lowercase().contains(&query)
                    || tool.description.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn clear(&mut self) {
        self.tools.clear();
        self.by_category.clear();
    }

    fn index_category(&mut self, tool: &Tool) {
        self.by_category
            .entry(tool.effective_category().to_string())
            .or_default()
            .insert(tool.name.clone());
    }

    fn drop_from_category(&mut self, category: &str, name: &str) {
        if let Some(names) = self.by_category.get_mut(category) {
            names.remove(name);
            if names.is_empty() {
                self.by_category.remove(category);
            }
        }
    }
}

/// Shape validation for a tool definition.
fn validate_tool(tool: &Tool) -> Result<(), McpError> {
    if tool.name.is_empty() {
        return Err(McpError::validation(
            "Invalid tool definition: name must not be empty",
        ));
    }
    if tool.description.is_empty() {
        return Err(McpError::validation(
            "Invalid tool definition: description must not be empty",
        ));
    }
    if tool.input_schema.schema_type != "object" {
        return Err(McpError::validation(format!(
            "Invalid tool definition: input schema type must be \"object\", got \"{}\"",
            tool.input_schema.schema_type
        )));
    }
    Ok(())
}
