//! Staged request/response transformations.

use crate::source::policy::{
    RequestMatch, RequestResponseTransformations as SourceStage, ResponseMatch, Transformation as SourceTransformation,
    TransformationStages, TransformationTemplate as SourceTemplate,
};
use crate::target::policy::{
    BodyTransformation, DynamicMetadataValue, Extraction, HeaderToAppend, RequestMatcher, RequestResponseTransformations,
    ResponseMatcher, SpanTransformer, StagedTransformation, Transformation, TransformationRequestMatcher,
    TransformationTemplate,
};

use super::matchers::transformation_header;
use super::{pascal_case, Findings, Mapped};

pub fn staged(source: &TransformationStages) -> Mapped<Option<StagedTransformation>> {
    let mut findings = Findings::new();
    if source.inherit_transformation {
        findings.unsupported("stagedTransformations inheritTransformation is not supported");
    }
    findings.overflow("stagedTransformations", &source.other);

    let mut stage = |name: &str, s: &Option<SourceStage>| {
        s.as_ref()
            .map(|s| findings.absorb(request_response(name, s)))
            .filter(|s| !s.requests.is_empty() || !s.responses.is_empty())
    };
    let out = StagedTransformation {
        early: stage("early", &source.early),
        regular: stage("regular", &source.regular),
        post_routing: stage("postRouting", &source.post_routing),
        log_request_response_info: source.log_request_response_info,
        escape_characters: source.escape_characters.map(escape),
    };
    let empty = out.early.is_none() && out.regular.is_none() && out.post_routing.is_none();
    Mapped::new((!empty).then_some(out), findings)
}

fn request_response(stage: &str, source: &SourceStage) -> Mapped<RequestResponseTransformations> {
    let mut findings = Findings::new();
    let mut out = RequestResponseTransformations::default();
    for (i, rule) in source.request_transforms.iter().enumerate() {
        out.requests.push(findings.absorb(request_rule(&format!("{stage}.requestTransforms[{i}]"), rule)));
    }
    for (i, rule) in source.response_transforms.iter().enumerate() {
        out.responses.push(findings.absorb(response_rule(&format!("{stage}.responseTransforms[{i}]"), rule)));
    }
    Mapped::new(out, findings)
}

fn request_rule(path: &str, rule: &RequestMatch) -> Mapped<RequestMatcher> {
    let mut findings = Findings::new();
    let matcher = rule.matcher.as_ref().map(|m| {
        if m.other.values().any(|v| !crate::source::is_unset(v)) {
            findings.unsupported(format!("transformation rule {path} match is not supported"));
        }
        TransformationRequestMatcher {
            headers: m.headers.iter().map(transformation_header).collect(),
        }
    });
    if rule.clear_route_cache {
        findings.unsupported(format!("transformation rule {path} clearRouteCache is not supported"));
    }
    if rule.response_transformation.is_some() {
        findings.unsupported(format!(
            "transformation rule {path} responseTransformation is not supported on a request match"
        ));
    }
    let transformation = rule
        .request_transformation
        .as_ref()
        .map(|t| findings.absorb(transformation(path, t)));
    Mapped::new(RequestMatcher { matcher, transformation }, findings)
}

fn response_rule(path: &str, rule: &ResponseMatch) -> Mapped<ResponseMatcher> {
    let mut findings = Findings::new();
    let response_code_details = match &rule.response_code_details {
        None => None,
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(other) => other.get("exact").and_then(|v| v.as_str()).map(str::to_string).or_else(|| {
            findings.unsupported(format!("transformation rule {path} responseCodeDetails is not supported"));
            None
        }),
    };
    let transformation = rule
        .response_transformation
        .as_ref()
        .map(|t| findings.absorb(transformation(path, t)));
    Mapped::new(
        ResponseMatcher {
            headers: rule.matchers.iter().map(transformation_header).collect(),
            response_code_details,
            transformation,
        },
        findings,
    )
}

fn transformation(path: &str, source: &SourceTransformation) -> Mapped<Transformation> {
    let mut findings = Findings::new();
    if source.header_body_transform.is_some() {
        findings.unsupported(format!("transformation {path} headerBodyTransform is not supported"));
    }
    if source.xslt_transformation.is_some() {
        findings.unsupported(format!("transformation {path} xsltTransformation is not supported"));
    }
    if source.log_request_response_info.is_some() {
        findings.unsupported(format!("transformation {path} logRequestResponseInfo is not supported"));
    }
    let template = source
        .transformation_template
        .as_ref()
        .map(|t| findings.absorb(template(path, t)));
    Mapped::new(Transformation { template }, findings)
}

fn template(path: &str, source: &SourceTemplate) -> Mapped<TransformationTemplate> {
    let mut findings = Findings::new();
    findings.overflow(&format!("transformation {path} template"), &source.other);

    let body_transformation = if let Some(body) = &source.body {
        Some(BodyTransformation {
            body_type: "Body".to_string(),
            body: Some(body.text.clone()),
        })
    } else if source.passthrough.is_some() {
        Some(body_kind("Passthrough"))
    } else if source.merge_extractors_to_body.is_some() {
        Some(body_kind("MergeExtractorsToBody"))
    } else if source.merge_json_keys.is_some() {
        findings.unsupported(format!("transformation {path} mergeJsonKeys is not supported"));
        None
    } else {
        None
    };

    let extractors = source
        .extractors
        .iter()
        .map(|(name, e)| {
            let extraction = Extraction {
                header: e.header.clone(),
                body: e.body.as_ref().map(|_| true),
                regex: e.regex.clone(),
                subgroup: (e.subgroup != 0).then_some(e.subgroup),
                mode: e.mode.as_deref().map(pascal_case),
                replacement_text: e.replacement_text.clone(),
            };
            (name.clone(), extraction)
        })
        .collect();

    let out = TransformationTemplate {
        advanced_templates: source.advanced_templates.then_some(true),
        extractors,
        headers: source.headers.iter().map(|(k, v)| (k.clone(), v.text.clone())).collect(),
        headers_to_append: source
            .headers_to_append
            .iter()
            .map(|h| HeaderToAppend {
                key: h.key.clone(),
                value: h.value.text.clone(),
            })
            .collect(),
        headers_to_remove: source.headers_to_remove.clone(),
        body_transformation,
        parse_body_behavior: source.parse_body_behavior.clone(),
        ignore_error_on_parse: source.ignore_error_on_parse.then_some(true),
        dynamic_metadata_values: source
            .dynamic_metadata_values
            .iter()
            .map(|d| DynamicMetadataValue {
                metadata_namespace: d.metadata_namespace.clone(),
                key: d.key.clone(),
                value: d.value.text.clone(),
            })
            .collect(),
        escape_characters: source.escape_characters.map(escape),
        span_transformer: source.span_transformer.as_ref().map(|s| SpanTransformer {
            name: s.name.text.clone(),
        }),
    };
    Mapped::new(out, findings)
}

fn body_kind(kind: &str) -> BodyTransformation {
    BodyTransformation {
        body_type: kind.to_string(),
        body: None,
    }
}

fn escape(on: bool) -> String {
    if on { "Escape" } else { "DontEscape" }.to_string()
}
