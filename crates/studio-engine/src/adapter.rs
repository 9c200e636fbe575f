use anyhow::{anyhow, Result};
use studio_contracts::catalog::{AspectRatio, Resolution};
use studio_contracts::history::GenerationKind;
use studio_contracts::images::ImageResource;
use studio_contracts::models::{
    ModelSelection, ModelSelector, ModelSpec, CAPABILITY_EDIT, CAPABILITY_MOCKUP, CAPABILITY_PRO,
};

use crate::credentials::{
    ensure_credential_selected, CredentialCheck, CredentialHost, NoCredentialHost,
};
use crate::dryrun::DryrunService;
use crate::extract::extract_images;
use crate::gemini::GeminiService;
use crate::service::{
    ContentPart, GenerateContentRequest, GenerationService, ImageConfig, ServiceRegistry,
};

/// Models used per workflow capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterModels {
    pub mockup: ModelSpec,
    pub edit: ModelSpec,
    pub pro: ModelSpec,
}

impl AdapterModels {
    pub fn defaults() -> Result<Self> {
        Self::resolve(&ModelSelector::default(), None, None).map(|(models, _)| models)
    }

    /// Applies the optional overrides: `standard` covers mockup and edit,
    /// `pro` the high-resolution workflow. Returns the fallback explanations
    /// for overrides that could not be honored.
    pub fn resolve(
        selector: &ModelSelector,
        standard: Option<&str>,
        pro: Option<&str>,
    ) -> Result<(Self, Vec<String>)> {
        let mut notes = Vec::new();
        let mut pick = |requested: Option<&str>, capability: &str| -> Result<ModelSpec> {
            let ModelSelection {
                model,
                fallback_reason,
                ..
            } = selector
                .select(requested, capability)
                .map_err(|message| anyhow!(message))?;
            if let Some(reason) = fallback_reason {
                if !notes.contains(&reason) {
                    notes.push(reason);
                }
            }
            Ok(model)
        };
        let models = Self {
            mockup: pick(standard, CAPABILITY_MOCKUP)?,
            edit: pick(standard, CAPABILITY_EDIT)?,
            pro: pick(pro, CAPABILITY_PRO)?,
        };
        Ok((models, notes))
    }

    pub fn for_kind(&self, kind: GenerationKind) -> &ModelSpec {
        match kind {
            GenerationKind::Mockup => &self.mockup,
            GenerationKind::Edit => &self.edit,
            GenerationKind::Pro => &self.pro,
        }
    }
}

/// The three request shapes the studio sends, plus the shared single-call
/// path. Holds no per-call state: credentials are re-read by the service on
/// every request.
pub struct GenerationAdapter {
    services: ServiceRegistry,
    credentials: Box<dyn CredentialHost>,
    models: AdapterModels,
}

impl GenerationAdapter {
    pub fn new(services: ServiceRegistry, models: AdapterModels) -> Self {
        Self {
            services,
            credentials: Box::new(NoCredentialHost),
            models,
        }
    }

    /// Gemini plus the offline dry-run service, with the given models.
    pub fn with_default_services(models: AdapterModels) -> Result<Self> {
        let mut services = ServiceRegistry::new();
        services.register(GeminiService::from_env()?);
        services.register(DryrunService::new());
        Ok(Self::new(services, models))
    }

    pub fn with_credential_host<H: CredentialHost + 'static>(mut self, host: H) -> Self {
        self.credentials = Box::new(host);
        self
    }

    pub fn models(&self) -> &AdapterModels {
        &self.models
    }

    pub fn generate_mockup(
        &self,
        logo: &ImageResource,
        product_name: &str,
        prompt_override: Option<&str>,
    ) -> Result<Vec<ImageResource>> {
        let prompt = prompt_override
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_mockup_prompt(product_name));
        let request = GenerateContentRequest::new(
            self.models.mockup.name.clone(),
            vec![ContentPart::InlineImage(logo.clone()), ContentPart::Text(prompt)],
        );
        self.invoke(&self.models.mockup, &request)
    }

    pub fn edit_image(
        &self,
        image: &ImageResource,
        instruction: &str,
    ) -> Result<Vec<ImageResource>> {
        let request = GenerateContentRequest::new(
            self.models.edit.name.clone(),
            vec![
                ContentPart::InlineImage(image.clone()),
                ContentPart::Text(instruction.to_string()),
            ],
        );
        self.invoke(&self.models.edit, &request)
    }

    pub fn generate_high_res(
        &self,
        prompt: &str,
        resolution: Resolution,
    ) -> Result<Vec<ImageResource>> {
        self.generate_high_res_framed(prompt, resolution, AspectRatio::default())
    }

    pub fn generate_high_res_framed(
        &self,
        prompt: &str,
        resolution: Resolution,
        aspect_ratio: AspectRatio,
    ) -> Result<Vec<ImageResource>> {
        let request = GenerateContentRequest::new(
            self.models.pro.name.clone(),
            vec![ContentPart::Text(prompt.to_string())],
        )
        .with_image_config(ImageConfig {
            image_size: Some(resolution.as_str().to_string()),
            aspect_ratio: Some(aspect_ratio.as_str().to_string()),
        });
        self.invoke(&self.models.pro, &request)
    }

    pub fn ensure_credential_selected(&self) -> CredentialCheck {
        ensure_credential_selected(self.credentials.as_ref())
    }

    fn invoke(
        &self,
        model: &ModelSpec,
        request: &GenerateContentRequest,
    ) -> Result<Vec<ImageResource>> {
        let service = self.service_for(model)?;
        let response = service.generate_content(request)?;
        Ok(extract_images(&response))
    }

    fn service_for(&self, model: &ModelSpec) -> Result<&dyn GenerationService> {
        self.services.get(&model.provider).ok_or_else(|| {
            anyhow!(
                "no generation service registered for provider '{}' (model {}); available: {}",
                model.provider,
                model.name,
                self.services.names().join(", ")
            )
        })
    }
}

pub fn default_mockup_prompt(product_name: &str) -> String {
    format!(
        "Create a professional, high-quality product mockup of a {product_name} \
featuring this logo. The logo should be clearly visible and naturally applied to the surface. \
The background should be clean and studio-lit."
    )
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use serde_json::json;
    use studio_contracts::catalog::{AspectRatio, Resolution};
    use studio_contracts::images::ImageResource;
    use studio_contracts::models::ModelSelector;

    use super::{default_mockup_prompt, AdapterModels, GenerationAdapter};
    use crate::service::{ContentPart, ServiceRegistry};
    use crate::test_support::{image_response, scripted_adapter, ScriptedService};

    fn logo() -> ImageResource {
        ImageResource::from_bytes("image/png", b"logo")
    }

    #[test]
    fn mockup_sends_logo_then_synthesized_prompt() -> anyhow::Result<()> {
        let (adapter, script) = scripted_adapter(vec![Ok(image_response(&["bW9ja3Vw"]))]);
        let images = adapter.generate_mockup(&logo(), "Ceramic Mug", None)?;
        assert_eq!(images.len(), 1);

        let requests = script.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gemini-2.5-flash-image");
        assert_eq!(requests[0].parts[0], ContentPart::InlineImage(logo()));
        assert_eq!(
            requests[0].parts[1],
            ContentPart::Text(default_mockup_prompt("Ceramic Mug"))
        );
        assert!(requests[0].image_config.is_none());
        Ok(())
    }

    #[test]
    fn mockup_override_replaces_prompt() -> anyhow::Result<()> {
        let (adapter, script) = scripted_adapter(vec![Ok(image_response(&[]))]);
        let images =
            adapter.generate_mockup(&logo(), "Tote Bag", Some("Logo on a tote, night market"))?;
        assert!(images.is_empty());
        assert_eq!(script.requests()[0].prompt_text(), "Logo on a tote, night market");
        Ok(())
    }

    #[test]
    fn edit_uses_instruction_verbatim() -> anyhow::Result<()> {
        let (adapter, script) = scripted_adapter(vec![Ok(image_response(&["ZWRpdA=="]))]);
        adapter.edit_image(&logo(), "  Add a retro filter ")?;
        let request = &script.requests()[0];
        assert_eq!(request.model, "gemini-2.5-flash-image");
        assert_eq!(request.prompt_text(), "  Add a retro filter ");
        Ok(())
    }

    #[test]
    fn high_res_targets_pro_model_with_size_and_square_ratio() -> anyhow::Result<()> {
        let (adapter, script) = scripted_adapter(vec![
            Ok(image_response(&["cHJv"])),
            Ok(image_response(&["cHJv"])),
        ]);
        adapter.generate_high_res("a red cube", Resolution::FourK)?;
        let wide = "16:9".parse::<AspectRatio>().map_err(anyhow::Error::msg)?;
        adapter.generate_high_res_framed("a red cube", Resolution::TwoK, wide)?;

        let requests = script.requests();
        let payload = requests[0].to_payload();
        assert_eq!(requests[0].model, "gemini-3-pro-image-preview");
        assert_eq!(requests[0].images().count(), 0);
        assert_eq!(
            payload["generationConfig"]["imageConfig"],
            json!({"imageSize": "4K", "aspectRatio": "1:1"})
        );
        assert_eq!(
            requests[1].to_payload()["generationConfig"]["imageConfig"]["aspectRatio"],
            json!("16:9")
        );
        Ok(())
    }

    #[test]
    fn service_errors_propagate() {
        let (adapter, script) =
            scripted_adapter(vec![Err("Gemini request failed (503): overloaded".to_string())]);
        let err = adapter.generate_high_res("a red cube", Resolution::OneK).unwrap_err();
        assert!(err.to_string().contains("503"));
        assert_eq!(script.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_provider_is_an_error() -> anyhow::Result<()> {
        let adapter = GenerationAdapter::new(ServiceRegistry::new(), AdapterModels::defaults()?);
        let err = adapter.edit_image(&logo(), "x").unwrap_err();
        assert!(err.to_string().contains("provider 'gemini'"));
        Ok(())
    }

    #[test]
    fn model_overrides_fall_back_with_reasons() -> anyhow::Result<()> {
        let selector = ModelSelector::default();
        let (models, notes) = AdapterModels::resolve(
            &selector,
            Some("dryrun-image-1"),
            Some("gemini-2.5-flash-image"),
        )?;
        assert_eq!(models.mockup.name, "dryrun-image-1");
        assert_eq!(models.edit.name, "dryrun-image-1");
        assert_eq!(models.pro.name, "gemini-3-pro-image-preview");
        assert_eq!(
            notes,
            vec![
                "Requested model 'gemini-2.5-flash-image' unavailable for capability 'pro'."
                    .to_string()
            ]
        );
        Ok(())
    }

    #[test]
    fn scripted_service_is_reachable_by_provider_name() {
        let (service, _script) = ScriptedService::new(vec![]);
        let mut registry = ServiceRegistry::new();
        registry.register(service);
        assert!(registry.get("gemini").is_some());
    }
}
