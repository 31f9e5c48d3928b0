//! Multi-document YAML output.

use serde::Serialize;

use crate::source::ObjectMeta;

use super::{TargetBuilder, TargetKind, TargetResource};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Document<'a, S> {
    api_version: &'static str,
    kind: &'static str,
    metadata: &'a ObjectMeta,
    spec: &'a S,
}

pub(crate) fn document<S: Serialize>(
    kind: TargetKind,
    metadata: &ObjectMeta,
    spec: &S,
) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(&Document {
        api_version: kind.api_version(),
        kind: kind.as_str(),
        metadata,
        spec,
    })
}

/// Render one resource as a YAML document (no `---` separator).
pub fn render_resource(resource: &TargetResource) -> Result<String, serde_yaml::Error> {
    resource.to_yaml()
}

/// Render every resource, in builder order, as one YAML stream.
pub fn render_yaml(target: &TargetBuilder) -> Result<String, serde_yaml::Error> {
    let mut out = String::new();
    for resource in target.iter() {
        out.push_str("---\n");
        out.push_str(&render_resource(resource)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::render_yaml;
    use crate::target::gateway::{GatewaySpec, Listener};
    use crate::target::route::DirectResponseSpec;
    use crate::target::{Object, TargetBuilder};

    #[test]
    fn documents_are_ordered_by_kind_then_identity() {
        let mut target = TargetBuilder::new();
        target.upsert(Object::new("default", "teapot", DirectResponseSpec { status: 418, body: None }));
        target.upsert(Object::new(
            "gloo-system",
            "gateway-proxy",
            GatewaySpec {
                gateway_class_name: "gloo-gateway-v2".to_string(),
                allowed_listeners: None,
                listeners: vec![Listener::http("http", None, 8080)],
            },
        ));

        let yaml = render_yaml(&target).expect("renders");
        let expected = "\
---
apiVersion: gateway.networking.k8s.io/v1
kind: Gateway
metadata:
  name: gateway-proxy
  namespace: gloo-system
spec:
  gatewayClassName: gloo-gateway-v2
  listeners:
  - name: http
    port: 8080
    protocol: HTTP
---
apiVersion: gateway.kgateway.dev/v1alpha1
kind: DirectResponse
metadata:
  name: teapot
  namespace: default
spec:
  status: 418
";
        assert_eq!(yaml, expected);
    }

    #[test]
    fn empty_target_renders_nothing() {
        assert_eq!(render_yaml(&TargetBuilder::new()).expect("renders"), "");
    }
}
