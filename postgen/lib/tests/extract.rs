use std::path::PathBuf;

use postgen_lib::{ERROR_HANDLER_METHOD, GoFile, PostgenError, extract_interface};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn extracts_handler_methods_in_declaration_order() {
    let interface = extract_interface(fixture("oas_server_gen.go"), "Handler").unwrap();

    let names: Vec<&str> = interface
        .methods
        .iter()
        .map(|method| method.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "AddPet",
            "DeletePet",
            "FindPetsByTags",
            "GetPetById",
            "UploadFile",
            "GetInventory",
            "PlaceOrder",
            "Ping",
            "NewError",
        ]
    );
    assert_eq!(
        interface.error_handler().map(|method| method.name.as_str()),
        Some(ERROR_HANDLER_METHOD)
    );
}

#[test]
fn extracts_import_table() {
    let file = GoFile::new(fixture("oas_server_gen.go")).unwrap();
    let imports = file.imports();

    let paths: Vec<&str> = imports.iter().map(|import| import.path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["context", "embed", "github.com/google/uuid", "github.com/ogen-go/ogen/http"]
    );

    let http = &imports[3];
    assert_eq!(http.alias, "ht");
    assert_eq!(http.package_name, "ht");

    let uuid = &imports[2];
    assert_eq!(uuid.alias, "");
    assert_eq!(uuid.package_name, "uuid");

    assert!(!imports[1].is_qualifying());
}

#[test]
fn keeps_doc_comments_and_signatures() {
    let interface = extract_interface(fixture("oas_server_gen.go"), "Handler").unwrap();

    let add_pet = &interface.methods[0];
    assert_eq!(
        add_pet.doc_comment,
        "AddPet implements addPet operation.\n\nAdd a new pet to the store.\n\nPOST /pet\n"
    );
    assert_eq!(add_pet.typed_parameters, "ctx context.Context, req *Pet");
    assert_eq!(add_pet.parameter_names, "ctx, req");
    assert_eq!(add_pet.returns, "*Pet, error");

    let upload = &interface.methods[4];
    assert_eq!(
        upload.typed_parameters,
        "ctx context.Context, files *[]ht.MultipartFile, owner uuid.UUID"
    );

    let find = &interface.methods[2];
    assert_eq!(find.returns, "[]Pet, error");

    let ping = &interface.methods[7];
    assert_eq!(ping.typed_parameters, "_ context.Context");
    assert_eq!(ping.parameter_names, "_");
    assert_eq!(ping.returns, "error");

    let new_error = &interface.methods[8];
    assert_eq!(new_error.returns, "*ErrorStatusCode");
}

#[test]
fn unknown_interface_is_reported() {
    let err = extract_interface(fixture("oas_server_gen.go"), "Server").unwrap_err();
    assert!(matches!(err, PostgenError::InterfaceNotFound { ref name, .. } if name == "Server"));
    assert_eq!(err.stage(), "extract");
}

#[test]
fn missing_file_is_a_read_error() {
    let err = extract_interface(fixture("absent.go"), "Handler").unwrap_err();
    assert!(matches!(err, PostgenError::Io { .. }));
    assert_eq!(err.stage(), "read");
}
