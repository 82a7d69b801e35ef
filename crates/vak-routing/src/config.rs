use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

use vak_common::error::{Error, Result};

/// Typed model of the Envoy bootstrap document this tool edits.
///
/// Only the parts the reconciler touches are typed: the route list behind the
/// single listener/filter-chain/HTTP-filter path, and the top-level cluster
/// list. Everything else (admin block, listener addresses, http_filters,
/// `@type` tags, ...) is captured in flattened mappings so a load/edit/save
/// cycle leaves unrelated entries in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    pub static_resources: StaticResources,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticResources {
    pub listeners: Vec<Listener>,
    pub clusters: Vec<Cluster>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listener {
    pub filter_chains: Vec<FilterChain>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterChain {
    pub filters: Vec<Filter>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Filter {
    pub typed_config: TypedConfig,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedConfig {
    pub route_config: RouteConfig,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    pub virtual_hosts: Vec<VirtualHost>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualHost {
    pub routes: Vec<Route>,
    #[serde(flatten)]
    pub extra: Mapping,
}

/// One route entry. Terminal/default routes that the reconciler never
/// creates (prefix matches, direct responses) still parse: their match
/// fields land in the optional slots or the flattened extras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(rename = "match")]
    pub route_match: RouteMatch,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteAction>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<HeaderMatch>>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderMatch {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact_match: Option<String>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAction {
    pub cluster: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub cluster_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lb_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_lookup_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typed_extension_protocol_options: Option<serde_yaml::Value>,
    pub load_assignment: LoadAssignment,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadAssignment {
    pub cluster_name: String,
    pub endpoints: Vec<EndpointGroup>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointGroup {
    pub lb_endpoints: Vec<LbEndpoint>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LbEndpoint {
    pub endpoint: Endpoint,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub address: Address,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub socket_address: SocketAddress,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketAddress {
    pub address: String,
    pub port_value: u32,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl Cluster {
    /// The release name this cluster forwards traffic to.
    pub fn target_address(&self) -> Option<&str> {
        let group = self.load_assignment.endpoints.first()?;
        let lb = group.lb_endpoints.first()?;
        Some(lb.endpoint.address.socket_address.address.as_str())
    }

    pub fn set_target_address(&mut self, address: &str) -> Result<()> {
        let socket = self
            .load_assignment
            .endpoints
            .first_mut()
            .and_then(|g| g.lb_endpoints.first_mut())
            .map(|lb| &mut lb.endpoint.address.socket_address)
            .ok_or_else(|| {
                Error::Config(format!("cluster {} has no endpoint to update", self.name))
            })?;
        socket.address = address.to_string();
        Ok(())
    }
}

impl RoutingConfig {
    pub fn load_from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("unable to read routing config {}: {e}", path.display()))
        })?;
        let config: RoutingConfig = serde_yaml::from_str(&raw).map_err(|e| {
            Error::Config(format!("unable to parse routing config {}: {e}", path.display()))
        })?;
        Ok(config)
    }

    pub fn save_to_yaml(&self, path: impl AsRef<Path>) -> Result<()> {
        let rendered = serde_yaml::to_string(self)?;
        std::fs::write(path.as_ref(), rendered)?;
        Ok(())
    }

    /// The route list behind the single listener/filter-chain/filter path.
    /// The document shape is assumed; a document without it is rejected here.
    pub fn routes_mut(&mut self) -> Result<&mut Vec<Route>> {
        self.static_resources
            .listeners
            .first_mut()
            .and_then(|l| l.filter_chains.first_mut())
            .and_then(|fc| fc.filters.first_mut())
            .and_then(|f| f.typed_config.route_config.virtual_hosts.first_mut())
            .map(|vh| &mut vh.routes)
            .ok_or_else(|| Error::Config("routing config has no virtual host route list".into()))
    }

    pub fn routes(&self) -> Result<&Vec<Route>> {
        self.static_resources
            .listeners
            .first()
            .and_then(|l| l.filter_chains.first())
            .and_then(|fc| fc.filters.first())
            .and_then(|f| f.typed_config.route_config.virtual_hosts.first())
            .map(|vh| &vh.routes)
            .ok_or_else(|| Error::Config("routing config has no virtual host route list".into()))
    }

    pub fn clusters(&self) -> &Vec<Cluster> {
        &self.static_resources.clusters
    }

    pub fn clusters_mut(&mut self) -> &mut Vec<Cluster> {
        &mut self.static_resources.clusters
    }
}
