//! Plugin loading.
//!
//! Plugins contribute steps by registering against a supplied
//! [`Registry`]; the loader holds their named registration hooks and
//! invokes them for an ordered module list. The core never performs
//! discovery itself: what to load, and in which order, comes from the
//! runner configuration.

use tracing::debug;

use crate::error::{CadenceError, Result};
use crate::plan::Registry;

/// A registration callback contributed by one module.
pub type RegisterHook = Box<dyn Fn(&mut Registry) -> Result<()> + Send + Sync>;

struct Plugin {
    name: String,
    hook: RegisterHook,
}

/// Catalog of named registration hooks.
#[derive(Default)]
pub struct PluginLoader {
    plugins: Vec<Plugin>,
}

impl PluginLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contribute a registration hook under a module name. A later hook
    /// under the same name replaces the earlier one.
    pub fn add<F>(&mut self, name: impl Into<String>, hook: F)
    where
        F: Fn(&mut Registry) -> Result<()> + Send + Sync + 'static,
    {
        let name = name.into();
        self.plugins.retain(|p| p.name != name);
        self.plugins.push(Plugin {
            name,
            hook: Box::new(hook),
        });
    }

    /// Names of every module with a hook, in contribution order.
    pub fn module_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name.as_str()).collect()
    }

    /// Invoke the hooks for the given modules, in list order.
    ///
    /// A module with no hook in the catalog is skipped silently, matching
    /// modules that simply ship no registrations. A hook that fails
    /// propagates its error, wrapped with the plugin name.
    pub fn load(&self, modules: &[String], registry: &mut Registry) -> Result<()> {
        for module in modules {
            match self.plugins.iter().find(|p| &p.name == module) {
                Some(plugin) => {
                    debug!("Loading registrations from '{}'", plugin.name);
                    (plugin.hook)(registry).map_err(|e| CadenceError::PluginFailed {
                        plugin: plugin.name.clone(),
                        message: e.to_string(),
                    })?;
                }
                None => debug!("Module '{}' provides no registrations", module),
            }
        }
        Ok(())
    }
}
