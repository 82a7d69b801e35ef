use serde_yaml::Mapping;

use vak_common::error::Result;
use vak_common::DeploymentUnit;

use crate::config::{Cluster, HeaderMatch, Route, RouteAction, RouteMatch, RoutingConfig};

const GRPC_SERVICE_PATH: &str = "/ekstep.speech_recognition.SpeechRecognizer";
const LANGUAGE_HEADER: &str = "language";
const ROUTE_TIMEOUT: &str = "60s";

/// The upstream methods that get routing entries. `recognize_audio` is a
/// streaming call with no REST form.
struct MethodRoutes {
    name: &'static str,
    grpc_match: bool,
    rest_match: bool,
}

const METHODS: [MethodRoutes; 3] = [
    MethodRoutes { name: "recognize", grpc_match: true, rest_match: true },
    MethodRoutes { name: "punctuate", grpc_match: true, rest_match: true },
    MethodRoutes { name: "recognize_audio", grpc_match: true, rest_match: false },
];

/// New clusters are stamped out of this template; only the name and target
/// address vary per unit.
const CLUSTER_TEMPLATE: &str = r#"
name: placeholder_cluster
type: LOGICAL_DNS
lb_policy: ROUND_ROBIN
connect_timeout: 30s
dns_lookup_family: V4_ONLY
typed_extension_protocol_options:
  envoy.extensions.upstreams.http.v3.HttpProtocolOptions:
    "@type": type.googleapis.com/envoy.extensions.upstreams.http.v3.HttpProtocolOptions
    explicit_http_config:
      http2_protocol_options: {}
load_assignment:
  cluster_name: placeholder_cluster
  endpoints:
  - lb_endpoints:
    - endpoint:
        address:
          socket_address:
            address: placeholder
            port_value: 50051
"#;

fn cluster_name_for(language_code: &str) -> String {
    format!("{language_code}_cluster")
}

fn new_cluster(language_code: &str, release_name: &str) -> Result<Cluster> {
    let mut cluster: Cluster = serde_yaml::from_str(CLUSTER_TEMPLATE)
        .map_err(vak_common::Error::Yaml)?;
    let name = cluster_name_for(language_code);
    cluster.name = name.clone();
    cluster.load_assignment.cluster_name = name;
    cluster.set_target_address(release_name)?;
    Ok(cluster)
}

fn grpc_path(method: &str) -> String {
    format!("{GRPC_SERVICE_PATH}/{method}")
}

fn rest_path(method: &str, language_code: &str) -> String {
    format!("/v1/{method}/{language_code}")
}

fn new_grpc_route(method: &str, language_code: &str, cluster_name: &str) -> Route {
    Route {
        route_match: RouteMatch {
            path: Some(grpc_path(method)),
            headers: Some(vec![HeaderMatch {
                name: LANGUAGE_HEADER.to_string(),
                exact_match: Some(language_code.to_string()),
                extra: Mapping::new(),
            }]),
            extra: Mapping::new(),
        },
        route: Some(RouteAction {
            cluster: cluster_name.to_string(),
            timeout: Some(ROUTE_TIMEOUT.to_string()),
            extra: Mapping::new(),
        }),
        extra: Mapping::new(),
    }
}

fn new_rest_route(method: &str, language_code: &str, cluster_name: &str) -> Route {
    Route {
        route_match: RouteMatch {
            path: Some(rest_path(method, language_code)),
            headers: Some(vec![HeaderMatch {
                name: "Content-Type".to_string(),
                exact_match: Some("application/json".to_string()),
                extra: Mapping::new(),
            }]),
            extra: Mapping::new(),
        },
        route: Some(RouteAction {
            cluster: cluster_name.to_string(),
            timeout: Some(ROUTE_TIMEOUT.to_string()),
            extra: Mapping::new(),
        }),
        extra: Mapping::new(),
    }
}

/// Lookups are exact string equality on path and header value; codes must be
/// supplied exactly as stored.
fn has_grpc_route(routes: &[Route], method: &str, language_code: &str) -> bool {
    let path = grpc_path(method);
    routes.iter().any(|r| {
        r.route_match.path.as_deref() == Some(path.as_str())
            && r.route_match
                .headers
                .as_ref()
                .and_then(|h| h.first())
                .and_then(|h| h.exact_match.as_deref())
                == Some(language_code)
    })
}

fn has_rest_route(routes: &[Route], method: &str, language_code: &str) -> bool {
    let path = rest_path(method, language_code);
    routes.iter().any(|r| r.route_match.path.as_deref() == Some(path.as_str()))
}

/// Ensure the cluster and all match routes for one deployment unit exist
/// exactly once, creating or repairing them as needed. Safe to apply any
/// number of times: a second pass with the same unit changes nothing.
pub fn apply_unit(mut config: RoutingConfig, unit: &DeploymentUnit) -> Result<RoutingConfig> {
    let cluster_name = cluster_name_for(unit.representative_code());

    let clusters = config.clusters_mut();
    match clusters.iter_mut().find(|c| c.name == cluster_name) {
        Some(cluster) => {
            // self-heal a drifted target address
            if cluster.target_address() != Some(unit.release_name()) {
                tracing::info!(
                    cluster=%cluster_name,
                    release=%unit.release_name(),
                    "repairing cluster target address"
                );
                cluster.set_target_address(unit.release_name())?;
            }
        }
        None => {
            tracing::info!(cluster=%cluster_name, release=%unit.release_name(), "creating cluster");
            clusters.push(new_cluster(unit.representative_code(), unit.release_name())?);
        }
    }

    let routes = config.routes_mut()?;
    // Inserting at `len - initial_len` keeps every pre-existing route —
    // including the terminal default block — after the routes added here.
    let initial_len = routes.len();
    for language_code in unit.language_codes() {
        for method in &METHODS {
            if method.grpc_match && !has_grpc_route(routes, method.name, language_code) {
                let route = new_grpc_route(method.name, language_code, &cluster_name);
                routes.insert(routes.len() - initial_len, route);
            }
            if method.rest_match && !has_rest_route(routes, method.name, language_code) {
                let route = new_rest_route(method.name, language_code, &cluster_name);
                routes.insert(routes.len() - initial_len, route);
            }
        }
    }

    Ok(config)
}
