mod common;

use anyhow::Result;
use common::{create_classroom, create_school, id_of, school_admin, unique_email, Api};
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn enroll(api: &Api, payload: Value) -> Result<(StatusCode, Value)> {
    api.post("/api/students", payload).await
}

#[tokio::test]
async fn classroom_from_another_school_looks_missing() -> Result<()> {
    let root = Api::superadmin().await?;
    let one = create_school(&root).await?;
    let two = create_school(&root).await?;
    let foreign = create_classroom(&root, Some(&two), "Room 201").await?;

    let (status, body) = enroll(
        &root,
        json!({ "school_id": one, "classroom_id": foreign, "name": "Bart Simpson", "email": unique_email("bart") }),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "classroom not found");

    // Same response as a classroom that never existed
    let (status, missing) = enroll(
        &root,
        json!({ "school_id": one, "classroom_id": uuid::Uuid::new_v4(), "name": "Bart Simpson", "email": unique_email("bart") }),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing, body);
    Ok(())
}

#[tokio::test]
async fn school_admin_lists_only_own_active_students() -> Result<()> {
    let root = Api::superadmin().await?;
    let one = create_school(&root).await?;
    let two = create_school(&root).await?;

    let (_, bart) = enroll(&root, json!({ "school_id": one, "name": "Bart Simpson", "email": unique_email("bart") })).await?;
    let (_, lisa) = enroll(&root, json!({ "school_id": one, "name": "Lisa Simpson", "email": unique_email("lisa") })).await?;
    enroll(&root, json!({ "school_id": two, "name": "Nelson Muntz", "email": unique_email("nelson") })).await?;
    let (status, _) = root.delete(&format!("/api/students/{}", id_of(&lisa))).await?;
    assert_eq!(status, StatusCode::OK);

    let admin = school_admin(&root, &one).await?;
    let (status, body) = admin.get("/api/students").await?;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["data"].as_array().unwrap().iter().filter_map(|s| s["id"].as_str()).collect();
    assert_eq!(ids, vec![id_of(&bart).as_str()]);
    Ok(())
}

#[tokio::test]
async fn transfer_into_deleted_classroom_is_not_found() -> Result<()> {
    let root = Api::superadmin().await?;
    let school = create_school(&root).await?;
    let admin = school_admin(&root, &school).await?;
    let from = create_classroom(&admin, None, "Room 101").await?;
    let to = create_classroom(&admin, None, "Room 102").await?;

    let (status, student) =
        enroll(&admin, json!({ "classroom_id": from, "name": "Bart Simpson", "email": unique_email("bart") })).await?;
    assert_eq!(status, StatusCode::CREATED);
    let student = id_of(&student);

    let (status, _) = admin.delete(&format!("/api/classrooms/{}", to)).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = admin
        .put(&format!("/api/students/{}/transfer", student), json!({ "classroom_id": to }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "classroom not found");

    let (_, body) = admin.get(&format!("/api/students/{}", student)).await?;
    assert_eq!(body["data"]["classroom_id"], from.as_str());
    Ok(())
}

#[tokio::test]
async fn transfer_within_school() -> Result<()> {
    let root = Api::superadmin().await?;
    let school = create_school(&root).await?;
    let admin = school_admin(&root, &school).await?;
    let to = create_classroom(&admin, None, "Room 103").await?;
    let (_, student) = enroll(&admin, json!({ "name": "Lisa Simpson", "email": unique_email("lisa") })).await?;

    let (status, body) = admin
        .put(&format!("/api/students/{}/transfer", id_of(&student)), json!({ "classroom_id": to }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["classroom_id"], to.as_str());

    let (_, body) = admin.get(&format!("/api/students?classroom_id={}", to)).await?;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn other_school_admin_cannot_touch_student() -> Result<()> {
    let root = Api::superadmin().await?;
    let one = create_school(&root).await?;
    let two = create_school(&root).await?;
    let (_, student) = enroll(&root, json!({ "school_id": two, "name": "Milhouse", "email": unique_email("milhouse") })).await?;
    let path = format!("/api/students/{}", id_of(&student));

    let outsider = school_admin(&root, &one).await?;
    assert_eq!(outsider.get(&path).await?.0, StatusCode::FORBIDDEN);
    assert_eq!(outsider.put(&path, json!({ "name": "Renamed" })).await?.0, StatusCode::FORBIDDEN);
    assert_eq!(outsider.delete(&path).await?.0, StatusCode::FORBIDDEN);

    let (status, body) = root.get(&path).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Milhouse");
    Ok(())
}

#[tokio::test]
async fn student_email_is_globally_unique() -> Result<()> {
    let root = Api::superadmin().await?;
    let one = create_school(&root).await?;
    let two = create_school(&root).await?;
    let email = unique_email("sherri");

    let (status, _) = enroll(&root, json!({ "school_id": one, "name": "Sherri", "email": email })).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = enroll(&root, json!({ "school_id": two, "name": "Terri", "email": email })).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "student with this email already exists");
    Ok(())
}
