use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::json;
use swaggen_core::{
    domain::UNCATEGORIZED, generate, generate_from_spec, plan::plan, ArtifactKind, Config, Error,
    OpenApiContext, Warning,
};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

async fn load(name: &str) -> OpenApiContext {
    OpenApiContext::from_file(fixture(name)).await.unwrap()
}

fn config_for(output: &Path) -> Config {
    Config::new("unused.json", output.to_string_lossy())
}

/// Relative path to file content for everything under `root`
fn snapshot(root: &Path) -> BTreeMap<PathBuf, String> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, String>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let content = std::fs::read_to_string(&path).unwrap();
                out.insert(path.strip_prefix(root).unwrap().to_path_buf(), content);
            }
        }
    }
    let mut out = BTreeMap::new();
    walk(root, root, &mut out);
    out
}

#[tokio::test]
async fn test_crm_plan_names_and_groups() {
    let spec = load("crm.json").await;
    let plan = plan(&spec, &Config::default()).unwrap();

    let keys: Vec<&str> = plan.groups.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys, vec!["leads", "branches", "auth"]);

    let leads = plan.group("leads").unwrap();
    let names: Vec<&str> = leads.endpoints.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "listLeadsGet",
            "insertLeadsPost",
            "getLeadsLeadIdGet",
            "updateLeadsLeadIdPatch",
            "deleteLeadsLeadIdDelete",
        ]
    );
    assert_eq!(leads.cache_tag, "LEADS_LIST");
    assert_eq!(leads.domain, "leads");

    let list = &leads.endpoints[0];
    assert!(list.is_list);
    assert_eq!(list.response_model.as_deref(), Some("PaginatedLeads"));
    assert_eq!(list.response_type, "IPaginatedLeadsSerializer");

    let delete = &leads.endpoints[4];
    assert_eq!(delete.response_type, "void");

    let auth = plan.group("auth").unwrap();
    assert_eq!(auth.endpoints[0].name, "loginForAccessTokenPost");
    assert_eq!(auth.endpoints[0].content_type, "application/x-www-form-urlencoded");

    let branches = plan.group("branches").unwrap();
    assert_eq!(branches.endpoints[0].name, "branchesGet");
    assert!(!branches.endpoints[0].is_list);
    assert!(branches.endpoints[0].response_is_array);
}

#[tokio::test]
async fn test_crm_names_are_unique_within_groups() {
    let spec = load("crm.json").await;
    let plan = plan(&spec, &Config::default()).unwrap();
    for group in &plan.groups {
        let mut seen = std::collections::BTreeSet::new();
        for endpoint in &group.endpoints {
            assert!(seen.insert(&endpoint.name), "duplicate {}", endpoint.name);
        }
    }
}

#[tokio::test]
async fn test_crm_param_interface_merges_path_and_body() {
    let spec = load("crm.json").await;
    let plan = plan(&spec, &Config::default()).unwrap();
    let leads = plan.group("leads").unwrap();

    let patch = &leads.endpoints[3];
    let interface = patch.param_interface.as_ref().unwrap();
    assert_eq!(interface.name, "ILeadsLeadIdPatchParams");
    assert_eq!(interface.field("lead_id").unwrap().ts_type, "number");
    assert_eq!(interface.field("body").unwrap().ts_type, "ILeadUpdateSerializer");

    let list = &leads.endpoints[0];
    let query = list.param_interface.as_ref().unwrap();
    assert_eq!(query.field("status").unwrap().ts_type, "LeadStatus");
    assert!(!query.field("limit").unwrap().required);
}

#[tokio::test]
async fn test_crm_domains_and_cycle() {
    let spec = load("crm.json").await;
    let plan = plan(&spec, &Config::default()).unwrap();
    let domains = &plan.domains;

    assert_eq!(domains.type_domain("Lead"), "leads");
    assert_eq!(domains.type_domain("LeadStatus"), "leads");
    assert_eq!(domains.type_domain("PaginatedLeads"), "leads");
    // reached only through references
    assert_eq!(domains.type_domain("LeadNote"), "leads");
    assert_eq!(domains.type_domain("NoteAuthor"), "leads");
    assert_eq!(domains.type_domain("Branch"), "branches");
    assert_eq!(domains.type_domain("Token"), "auth");

    assert_eq!(domains.type_domain("CycleA"), UNCATEGORIZED);
    assert_eq!(domains.type_domain("CycleB"), UNCATEGORIZED);
    assert!(plan.warnings.iter().any(|w| matches!(
        w,
        Warning::DomainResolutionExhausted { names } if names == &vec!["CycleA".to_string(), "CycleB".to_string()]
    )));
}

#[tokio::test]
async fn test_plan_is_deterministic() {
    let spec = load("crm.json").await;
    let config = Config::default();
    let first = plan(&spec, &config).unwrap();
    let second = plan(&spec, &config).unwrap();

    let describe = |p: &swaggen_core::GenerationPlan| {
        p.groups
            .iter()
            .map(|g| {
                let names: Vec<String> = g.endpoints.iter().map(|e| e.name.clone()).collect();
                (g.key.clone(), g.domain.clone(), names, g.references())
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(describe(&first), describe(&second));
    assert_eq!(
        first.domains.types().collect::<Vec<_>>(),
        second.domains.types().collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_legacy_document() {
    let spec = load("petstore_v2.json").await;
    let mut config = Config::default();
    config.api_base_path = "/v2".to_string();
    let plan = plan(&spec, &config).unwrap();

    let keys: Vec<&str> = plan.groups.iter().map(|g| g.key.as_str()).collect();
    assert_eq!(keys, vec!["pet", "store"]);

    let pet = plan.group("pet").unwrap();
    let add = &pet.endpoints[0];
    assert_eq!(add.name, "addANewPetToTheStorePost");
    assert!(add.has_body);
    let interface = add.param_interface.as_ref().unwrap();
    assert_eq!(interface.name, "IPetPostParams");
    assert_eq!(interface.field("body").unwrap().ts_type, "IPetSerializer");

    let form = pet
        .endpoints
        .iter()
        .find(|e| e.path == "/v2/pet/{petId}" && e.http_method == "POST")
        .unwrap();
    assert_eq!(form.form_params, vec!["name", "status"]);
    assert_eq!(form.content_type, "application/x-www-form-urlencoded");
    assert_eq!(form.response_type, "void");

    assert_eq!(plan.domains.type_domain("Pet"), "pet");
    assert_eq!(plan.domains.type_domain("PetStatus"), "pet");
    assert_eq!(plan.domains.type_domain("Order"), "store");
}

#[tokio::test]
async fn test_generate_crm_tree() {
    let temp_dir = tempfile::tempdir().unwrap();
    let spec = load("crm.json").await;
    let config = config_for(temp_dir.path());

    let report = generate_from_spec(&spec, &config).await.unwrap();
    assert!(!report.written.is_empty());
    assert!(report.written.iter().all(|p| p.exists()));

    let files = snapshot(temp_dir.path());
    for expected in [
        "models/leads/Lead.ts",
        "models/leads/LeadStatus.ts",
        "models/branches/Branch.ts",
        "models/uncategorized/CycleA.ts",
        "params/leads.params.ts",
        "services/leads/leads.ts",
        "thunks/leads/leads.thunk.ts",
        "hooks/leads.hooks.ts",
        "slices/LeadSlice.ts",
        "constants/tags.ts",
        "redux/store.ts",
        "redux/hooks.ts",
    ] {
        assert!(files.contains_key(Path::new(expected)), "missing {}", expected);
    }

    let lead = &files[Path::new("models/leads/Lead.ts")];
    assert!(lead.contains("export const LeadSchema = z.object({"));
    assert!(lead.contains("  status: LeadStatusSchema,"));
    assert!(lead.contains("  branch: z.lazy(() => BranchSchema).nullable().optional(),"));
    assert!(lead.contains("import { BranchSchema } from '../branches/Branch';"));
    assert!(lead.contains("export type ILeadSerializer = z.infer<typeof LeadSchema>;"));

    let status = &files[Path::new("models/leads/LeadStatus.ts")];
    assert!(status.contains("export const LeadStatusValues = ['new', 'contacted', 'won', 'lost'] as const;"));

    let tags = &files[Path::new("constants/tags.ts")];
    assert!(tags.contains("LEADS_LIST: 'LEADS_LIST',"));
    assert!(tags.contains("AUTH_LIST: 'AUTH_LIST',"));

    // an upsert model shares its slice with the model it feeds
    assert!(!files.contains_key(Path::new("slices/LeadUpsertSlice.ts")));
}

#[tokio::test]
async fn test_generation_is_byte_identical() {
    let spec = load("crm.json").await;
    let first_dir = tempfile::tempdir().unwrap();
    let second_dir = tempfile::tempdir().unwrap();

    generate_from_spec(&spec, &config_for(first_dir.path())).await.unwrap();
    generate_from_spec(&spec, &config_for(second_dir.path())).await.unwrap();

    assert_eq!(snapshot(first_dir.path()), snapshot(second_dir.path()));
}

#[tokio::test]
async fn test_empty_document() {
    let temp_dir = tempfile::tempdir().unwrap();
    let spec = OpenApiContext::new(json!({}));

    let report = generate_from_spec(&spec, &config_for(temp_dir.path())).await.unwrap();
    assert!(report.warnings.is_empty());

    let files = snapshot(temp_dir.path());
    assert!(files.keys().all(|p| !p.starts_with("models")));
    assert!(files.contains_key(Path::new("constants/tags.ts")));
    assert!(files[Path::new("redux/store.ts")].contains("export const rootReducer = (state"));
}

#[tokio::test]
async fn test_clean_and_exclusions() {
    let temp_dir = tempfile::tempdir().unwrap();
    let stale = temp_dir.path().join("stale.ts");
    tokio::fs::write(&stale, "export {};").await.unwrap();

    let spec = load("crm.json").await;
    let mut config = config_for(temp_dir.path());
    config.clean = true;
    config.exclude = vec![ArtifactKind::Hooks, ArtifactKind::Store, ArtifactKind::Slices];

    generate_from_spec(&spec, &config).await.unwrap();
    assert!(!stale.exists());
    assert!(!temp_dir.path().join("hooks").exists());
    assert!(!temp_dir.path().join("redux").exists());
    assert!(!temp_dir.path().join("slices").exists());
    assert!(temp_dir.path().join("services/leads/leads.ts").exists());
}

#[tokio::test]
async fn test_contradictory_exclusions_are_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    let spec = load("crm.json").await;
    let mut config = config_for(temp_dir.path());
    config.exclude = vec![ArtifactKind::Services];

    let err = generate_from_spec(&spec, &config).await.unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(snapshot(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_template_override_and_hooks() {
    let output_dir = tempfile::tempdir().unwrap();
    let template_dir = tempfile::tempdir().unwrap();
    tokio::fs::write(
        template_dir.path().join("tags.ts.tera"),
        "{% for tag in tags %}{{ tag }}\n{% endfor %}",
    )
    .await
    .unwrap();

    let spec = load("crm.json").await;
    let mut config = config_for(output_dir.path());
    config.template_dir = Some(template_dir.path().to_string_lossy().into_owned());
    config.post_generate = vec!["touch hooked".to_string()];

    generate_from_spec(&spec, &config).await.unwrap();

    let tags = tokio::fs::read_to_string(output_dir.path().join("constants/tags.ts"))
        .await
        .unwrap();
    assert_eq!(tags, "LEADS_LIST\nBRANCHES_LIST\nAUTH_LIST\n");
    assert!(output_dir.path().join("hooked").exists());
}

#[tokio::test]
async fn test_generate_from_file_location() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = Config::new(
        fixture("petstore_v2.json").to_string_lossy(),
        temp_dir.path().to_string_lossy(),
    );
    config.api_base_path = "v2".to_string();

    let report = generate(&config).await.unwrap();
    assert!(report.written.contains(&temp_dir.path().join("models/pet/Pet.ts")));
    assert!(temp_dir.path().join("services/store/store.ts").exists());
}

#[tokio::test]
async fn test_non_ascii_schema_names_plan() {
    let spec = OpenApiContext::new(json!({
        "components": { "schemas": {
            "\u{212A}_api_x": { "type": "object", "properties": { "id": { "type": "integer" } } },
            "\u{130}nfo": { "type": "string", "enum": ["a"] }
        } }
    }));
    let plan = plan(&spec, &Config::default()).unwrap();
    assert_eq!(plan.types.types.len(), 2);
    assert_eq!(plan.domains.type_domain("\u{212A}_api_x"), UNCATEGORIZED);
}
