// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{settings, FakeDashboard};
use dashcrawl::domain::repositories::credential_repository::{CredentialError, CredentialRepository};
use dashcrawl::engines::session_driver::{LoginError, SessionDriver};
use dashcrawl::infrastructure::credentials::CsvCredentialLoader;
use tempfile::TempDir;

const ID_INPUT: &str = "#input_item_id input";
const PW_INPUT: &str = "#input_item_pw input";

fn write_credentials(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("info_naver.csv");
    std::fs::write(&path, "id,pw,account\nshop_owner, s3cret ,5921383\n").unwrap();
    path
}

#[tokio::test(start_paused = true)]
async fn test_login_with_loaded_credentials() {
    let dir = TempDir::new().unwrap();
    write_credentials(&dir);
    let settings = settings(dir.path(), Vec::new());

    let credential = CsvCredentialLoader::new(dir.path().join("info_naver"))
        .load()
        .unwrap();
    assert_eq!(credential.identifier(), "shop_owner");
    assert_eq!(credential.secret(), "s3cret");
    assert_eq!(credential.account_id(), Some(5921383));

    let submit = settings.login.submit_selector.clone();
    let dashboard = FakeDashboard::new()
        .element(ID_INPUT)
        .element(PW_INPUT)
        .element(&submit)
        .click_removes(&submit, &[ID_INPUT, PW_INPUT]);

    let driver = SessionDriver::new(settings.login.clone()).with_service_id("5921383");
    driver.login(&dashboard, &credential).await.unwrap();
    assert!(driver.navigate_to_base(&dashboard).await.unwrap());

    let visited = dashboard.visited();
    assert_eq!(visited[0], settings.login.login_url);
    assert_eq!(visited.last(), Some(&settings.login.base_url));
}

#[tokio::test(start_paused = true)]
async fn test_visible_login_form_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write_credentials(&dir);
    let settings = settings(dir.path(), Vec::new());
    let credential = CsvCredentialLoader::new(path).load().unwrap();

    let dashboard = FakeDashboard::new()
        .element(ID_INPUT)
        .element(PW_INPUT)
        .element(&settings.login.submit_selector);

    let err = SessionDriver::new(settings.login.clone())
        .login(&dashboard, &credential)
        .await
        .unwrap_err();
    assert!(matches!(err, LoginError::FormStillVisible));
}

#[tokio::test(start_paused = true)]
async fn test_missing_login_fields() {
    let dir = TempDir::new().unwrap();
    let path = write_credentials(&dir);
    let settings = settings(dir.path(), Vec::new());
    let credential = CsvCredentialLoader::new(path).load().unwrap();

    let err = SessionDriver::new(settings.login.clone())
        .login(&FakeDashboard::new(), &credential)
        .await
        .unwrap_err();
    assert!(matches!(err, LoginError::FieldNotFound("identifier")));
}

#[test]
fn test_missing_credentials_file() {
    let dir = TempDir::new().unwrap();
    let err = CsvCredentialLoader::new(dir.path().join("absent.csv"))
        .load()
        .unwrap_err();
    assert!(matches!(err, CredentialError::NotFound(_)));
}
