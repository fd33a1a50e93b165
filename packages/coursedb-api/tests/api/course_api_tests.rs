//! Course endpoint tests.

use hyper::body::Bytes;
use hyper::Method;
use serde_json::json;
use tempfile::tempdir;

use coursedb_core::config::DbConfig;
use coursedb_core::factory::{CourseFactory, StudentFactory};
use coursedb_core::persistence::PersistenceManager;

use super::client::ApiClient;

const COURSES: &str = "/api/v1/courses/";

fn course_url(id: u64) -> String {
    format!("/api/v1/courses/{}/", id)
}

#[tokio::test]
async fn test_get_first_course() {
    let client = ApiClient::new();
    let courses = CourseFactory::new().make(client.db(), 10).unwrap();

    let response = client
        .get(&format!("{}?id={}", COURSES, courses[0].id))
        .await;
    let data = response.json();

    assert_eq!(response.status, 200);
    assert_eq!(data[0]["id"], courses[0].id);
    assert_eq!(data[0]["name"], courses[0].name.as_str());
}

#[tokio::test]
async fn test_get_courses_list() {
    let client = ApiClient::new();
    let courses = CourseFactory::new().make(client.db(), 10).unwrap();

    let response = client.get(COURSES).await;
    let data = response.json();

    assert_eq!(response.status, 200);
    let data = data.as_array().unwrap();
    assert_eq!(data.len(), courses.len());
    for (item, course) in data.iter().zip(&courses) {
        assert_eq!(item["id"], course.id);
        assert_eq!(item["name"], course.name.as_str());
    }
}

#[tokio::test]
async fn test_empty_list() {
    let client = ApiClient::new();
    let response = client.get(COURSES).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.json(), json!([]));
}

#[tokio::test]
async fn test_filter_id_courses() {
    let client = ApiClient::new();
    let courses = CourseFactory::new().make(client.db(), 100).unwrap();
    let id = courses[0].id;

    let response = client.get(&format!("{}?id={}", COURSES, id)).await;
    let data = response.json();

    assert_eq!(response.status, 200);
    assert_eq!(data.as_array().unwrap().len(), 1);
    assert_eq!(data[0]["name"], courses[0].name.as_str());
}

#[tokio::test]
async fn test_filter_name_courses() {
    let client = ApiClient::new();
    let courses = CourseFactory::new().make(client.db(), 100).unwrap();
    let name = &courses[0].name;

    let response = client.get(&format!("{}?name={}", COURSES, name)).await;
    let data = response.json();

    assert_eq!(response.status, 200);
    assert_eq!(data[0]["id"], courses[0].id);
}

#[tokio::test]
async fn test_filter_name_with_encoded_spaces() {
    let client = ApiClient::new();
    let course = CourseFactory::new()
        .name("Python Development")
        .make_one(client.db())
        .unwrap();
    CourseFactory::new().make(client.db(), 5).unwrap();

    for query in ["name=Python%20Development", "name=Python+Development"] {
        let response = client.get(&format!("{}?{}", COURSES, query)).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.json(), json!([{"id": course.id, "name": "Python Development", "students": []}]));
    }
}

#[tokio::test]
async fn test_filters_combine_with_and() {
    let client = ApiClient::new();
    let courses = CourseFactory::new().make(client.db(), 5).unwrap();

    let matching = format!("{}?id={}&name={}", COURSES, courses[1].id, courses[1].name);
    let data = client.get(&matching).await.json();
    assert_eq!(data.as_array().unwrap().len(), 1);
    assert_eq!(data[0]["id"], courses[1].id);

    let mismatched = format!("{}?id={}&name={}", COURSES, courses[1].id, courses[2].name);
    let response = client.get(&mismatched).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.json(), json!([]));
}

#[tokio::test]
async fn test_filter_invalid_id() {
    let client = ApiClient::new();
    let response = client.get(&format!("{}?id=abc", COURSES)).await;
    assert_eq!(response.status, 400);
    assert_eq!(response.json()["success"], false);
    assert_eq!(response.json()["error"]["code"], "400");
}

#[tokio::test]
async fn test_literal_scenario() {
    let client = ApiClient::new();
    let courses: Vec<_> = (0..10)
        .map(|i| {
            CourseFactory::new()
                .name(format!("C{}", i))
                .make_one(client.db())
                .unwrap()
        })
        .collect();
    let c3 = &courses[3];

    let response = client.get(&format!("{}?id={}", COURSES, c3.id)).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.json(), json!([{"id": c3.id, "name": "C3", "students": []}]));
}

#[tokio::test]
async fn test_create_course() {
    let client = ApiClient::new();
    let count = client.db().course_count().unwrap();
    let students = StudentFactory::new().make(client.db(), 10).unwrap();
    let ids_students: Vec<u64> = students.iter().map(|s| s.id).collect();

    let response = client
        .post(COURSES, &json!({"name": "Python Development", "students": ids_students}))
        .await;

    assert_eq!(response.status, 201);
    assert_eq!(client.db().course_count().unwrap(), count + 1);

    let data = response.json();
    assert_eq!(data["name"], "Python Development");
    assert_eq!(data["students"], json!(ids_students));
    let stored = client.db().get_course(data["id"].as_u64().unwrap()).unwrap();
    assert_eq!(stored.students.len(), 10);
}

#[tokio::test]
async fn test_create_course_without_students() {
    let client = ApiClient::new();

    let response = client.post(COURSES, &json!({"name": "Rust"})).await;
    assert_eq!(response.status, 201);
    assert_eq!(response.json()["students"], json!([]));
    assert_eq!(client.db().course_count().unwrap(), 1);
}

#[tokio::test]
async fn test_create_course_from_form() {
    let client = ApiClient::new();
    let students = StudentFactory::new().make(client.db(), 2).unwrap();

    let body = format!(
        "name=Python+Development&students={}&students={}",
        students[0].id, students[1].id
    );
    let response = client.post_form(COURSES, &body).await;

    assert_eq!(response.status, 201);
    assert_eq!(
        response.json()["students"],
        json!([students[0].id, students[1].id])
    );
}

#[tokio::test]
async fn test_create_course_rejects_invalid_payloads() {
    let client = ApiClient::new();
    let student = StudentFactory::new().make_one(client.db()).unwrap();

    let cases = [
        json!({"students": [student.id]}),
        json!({"name": ""}),
        json!({"name": "   "}),
        json!({"name": "Rust", "students": [student.id, student.id + 1]}),
        json!({"name": "Rust", "students": "all"}),
    ];
    for body in cases {
        let response = client.post(COURSES, &body).await;
        assert_eq!(response.status, 400, "payload {} should be rejected", body);
        assert!(response.json()["error"]["details"].is_string());
    }
    assert_eq!(client.db().course_count().unwrap(), 0);
}

#[tokio::test]
async fn test_update_course() {
    let client = ApiClient::new();
    let student = StudentFactory::new().make_one(client.db()).unwrap();
    let courses = CourseFactory::new()
        .students([student.id])
        .make(client.db(), 10)
        .unwrap();
    let id = courses[0].id;
    let new_data = json!({"name": "Django"});

    let update_response = client.patch(&course_url(id), &new_data).await;
    let get_response = client.get(&course_url(id)).await;
    let data = get_response.json();

    assert_eq!(update_response.status, 200);
    assert_eq!(get_response.status, 200);
    assert_eq!(data["name"], new_data["name"]);
    assert_eq!(data["id"], id);
    assert_eq!(data["students"], json!([student.id]));
    assert_eq!(update_response.json(), data);
}

#[tokio::test]
async fn test_patch_students_only() {
    let client = ApiClient::new();
    let students = StudentFactory::new().make(client.db(), 3).unwrap();
    let course = CourseFactory::new().name("Rust").make_one(client.db()).unwrap();

    let response = client
        .patch(&course_url(course.id), &json!({"students": [students[2].id]}))
        .await;
    assert_eq!(response.status, 200);
    assert_eq!(response.json()["name"], "Rust");
    assert_eq!(response.json()["students"], json!([students[2].id]));
}

#[tokio::test]
async fn test_patch_with_unknown_student_changes_nothing() {
    let client = ApiClient::new();
    let course = CourseFactory::new().name("Rust").make_one(client.db()).unwrap();

    let response = client
        .patch(&course_url(course.id), &json!({"name": "Django", "students": [404]}))
        .await;
    assert_eq!(response.status, 400);
    assert_eq!(client.db().get_course(course.id).unwrap(), course);
}

#[tokio::test]
async fn test_put_course() {
    let client = ApiClient::new();
    let student = StudentFactory::new().make_one(client.db()).unwrap();
    let course = CourseFactory::new()
        .students([student.id])
        .make_one(client.db())
        .unwrap();

    let response = client.put(&course_url(course.id), &json!({"name": "Go"})).await;
    assert_eq!(response.status, 200);
    assert_eq!(
        response.json(),
        json!({"id": course.id, "name": "Go", "students": []})
    );

    let response = client.put(&course_url(course.id), &json!({"students": []})).await;
    assert_eq!(response.status, 400);
}

#[tokio::test]
async fn test_remove_course() {
    let client = ApiClient::new();
    let student = StudentFactory::new().make_one(client.db()).unwrap();
    let courses = CourseFactory::new()
        .students([student.id])
        .make(client.db(), 3)
        .unwrap();
    let id = courses[0].id;
    let count = client.db().course_count().unwrap();

    let response = client.delete(&course_url(id)).await;

    assert_eq!(response.status, 204);
    assert!(response.body.is_empty());
    assert_eq!(client.db().course_count().unwrap(), count - 1);
    assert_eq!(client.get(&course_url(id)).await.status, 404);
    assert_eq!(client.db().student_count().unwrap(), 1);
}

#[tokio::test]
async fn test_missing_course_returns_404() {
    let client = ApiClient::new();
    CourseFactory::new().make(client.db(), 2).unwrap();

    assert_eq!(client.get(&course_url(99)).await.status, 404);
    assert_eq!(
        client.patch(&course_url(99), &json!({"name": "x"})).await.status,
        404
    );
    assert_eq!(client.put(&course_url(99), &json!({"name": "x"})).await.status, 404);

    let response = client.delete(&course_url(99)).await;
    assert_eq!(response.status, 404);
    assert_eq!(response.json()["error"]["code"], "404");
    assert_eq!(client.db().course_count().unwrap(), 2);
}

#[tokio::test]
async fn test_missing_course_wins_over_invalid_payload() {
    let client = ApiClient::new();
    StudentFactory::new().make_one(client.db()).unwrap();
    CourseFactory::new().make_one(client.db()).unwrap();
    let url = course_url(999);

    let cases = [
        json!({"name": "Django", "students": [404]}),
        json!({"name": ""}),
        json!({"name": "   ", "students": "all"}),
    ];
    for body in cases {
        let response = client.patch(&url, &body).await;
        assert_eq!(response.status, 404, "PATCH {}", body);
        assert_eq!(response.json()["error"]["code"], "404");

        let response = client.put(&url, &body).await;
        assert_eq!(response.status, 404, "PUT {}", body);
    }

    for method in [Method::PATCH, Method::PUT] {
        let response = client
            .send(method, &url, Some("application/json"), Bytes::from("{not json"))
            .await;
        assert_eq!(response.status, 404);
    }

    assert_eq!(client.db().course_count().unwrap(), 1);
}

#[tokio::test]
async fn test_patch_null_name_keeps_value() {
    let client = ApiClient::new();
    let student = StudentFactory::new().make_one(client.db()).unwrap();
    let course = CourseFactory::new()
        .name("Rust")
        .students([student.id])
        .make_one(client.db())
        .unwrap();

    let response = client
        .patch(&course_url(course.id), &json!({"name": null}))
        .await;
    assert_eq!(response.status, 200);
    assert_eq!(
        response.json(),
        json!({"id": course.id, "name": "Rust", "students": [student.id]})
    );
    assert_eq!(client.db().get_course(course.id).unwrap(), course);
}

#[tokio::test]
async fn test_invalid_course_id_in_path() {
    let client = ApiClient::new();
    CourseFactory::new().make_one(client.db()).unwrap();

    for path in ["/api/v1/courses/abc/", "/api/v1/courses/-1/", "/api/v1/courses/18446744073709551616/"] {
        assert_eq!(client.get(path).await.status, 404, "GET {}", path);
        assert_eq!(client.delete(path).await.status, 404, "DELETE {}", path);
        assert_eq!(
            client.patch(path, &json!({"name": ""})).await.status,
            404,
            "PATCH {}",
            path
        );
    }
    assert_eq!(client.db().course_count().unwrap(), 1);
}

#[tokio::test]
async fn test_routing_edges() {
    let client = ApiClient::new();
    let course = CourseFactory::new().make_one(client.db()).unwrap();

    // Trailing slash is optional
    assert_eq!(client.get("/api/v1/courses").await.status, 200);
    assert_eq!(
        client.get(&format!("/api/v1/courses/{}", course.id)).await.status,
        200
    );

    assert_eq!(client.get("/api/v1/students/").await.status, 404);
    assert_eq!(client.delete(COURSES).await.status, 405);
    assert_eq!(
        client.post(&course_url(course.id), &json!({"name": "x"})).await.status,
        405
    );
}

#[tokio::test]
async fn test_mutations_write_snapshot() {
    let temp_dir = tempdir().unwrap();
    let config = DbConfig {
        data_dir: Some(temp_dir.path().to_path_buf()),
        persistence_retry_delay_ms: 0,
        ..Default::default()
    };
    let persistence = PersistenceManager::from_config(&config);
    let client = ApiClient::with_persistence(config.clone(), persistence);

    let created = client.post(COURSES, &json!({"name": "Rust"})).await.json();
    client.post(COURSES, &json!({"name": "Go"})).await;
    let id = created["id"].as_u64().unwrap();
    client.patch(&course_url(id), &json!({"name": "Django"})).await;

    let reader = PersistenceManager::new(temp_dir.path(), &config);
    let restored = reader.load().unwrap();
    assert_eq!(restored.course_count().unwrap(), 2);
    assert_eq!(restored.get_course(id).unwrap().name, "Django");

    client.delete(&course_url(id)).await;
    assert_eq!(reader.load().unwrap().course_count().unwrap(), 1);
}

#[tokio::test]
async fn test_mutations_skip_snapshot_when_write_through_disabled() {
    let temp_dir = tempdir().unwrap();
    let config = DbConfig {
        data_dir: Some(temp_dir.path().to_path_buf()),
        persist_on_write: false,
        ..Default::default()
    };
    let persistence = PersistenceManager::from_config(&config);
    let client = ApiClient::with_persistence(config.clone(), persistence);

    let response = client.post(COURSES, &json!({"name": "Rust"})).await;
    assert_eq!(response.status, 201);

    let reader = PersistenceManager::new(temp_dir.path(), &config);
    assert!(!reader.snapshot_path().exists());
}
