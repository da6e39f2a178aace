use axum::http::StatusCode;
use project_submission_server::join_code;
use project_submission_server::model::classroom::{
    ClassroomDetailResponse, ClassroomSummary, CreatedClassroomResponse, JoinClassroomResponse,
    JoinCodeResponse, MemberResponse,
};
use project_submission_server::model::submission::{
    ClassroomSubmissionListResponse, SubmissionStatus,
};
use project_submission_server::payloads::classroom::{
    ClassroomActionPayload, CreateClassroomPayload, JoinClassroomPayload, UpdateClassroomPayload,
};
use project_submission_server::response::{ApiResponse, Page};
use serde_json::{Value, json};
use std::future::IntoFuture;

mod helpers;
use helpers::{
    count_memberships, create_test_classroom, create_test_membership, create_test_student,
    create_test_submission, create_test_teacher, create_test_user, fetch_join_code,
    fetch_submission, set_test_grade, setup_test_environment,
};

// create

#[tokio::test]
async fn test_create_classroom_success() {
    let env = setup_test_environment().await;
    let teacher_id = create_test_teacher(&env.pool, "prof").await;

    let payload = CreateClassroomPayload {
        user_id: teacher_id,
        title: "Web Development 2025".to_string(),
        description: "Build and deploy a full-stack application".to_string(),
        requirements_file: Some("requirements/brief.pdf".to_string()),
    };
    let response = env.server.post("/classrooms/create").json(&payload).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<CreatedClassroomResponse> = response.json();
    let created = body.data.unwrap();
    assert!(join_code::is_well_formed(&created.join_code));
    assert_eq!(
        fetch_join_code(&env.pool, created.classroom_id).await,
        Some(created.join_code)
    );
}

#[tokio::test]
async fn test_create_classroom_forbidden_for_student() {
    let env = setup_test_environment().await;
    let student_id = create_test_student(&env.pool, "stud").await;

    let payload = CreateClassroomPayload {
        user_id: student_id,
        title: "Not allowed".to_string(),
        description: "Students cannot create classrooms".to_string(),
        requirements_file: None,
    };
    let response = env.server.post("/classrooms/create").json(&payload).await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: ApiResponse<Value> = response.json();
    assert_eq!(body.status_code, 403);
    assert!(body.data.is_none());
}

#[tokio::test]
async fn test_create_classroom_invalid_fields() {
    let env = setup_test_environment().await;
    let teacher_id = create_test_teacher(&env.pool, "prof").await;

    let response = env
        .server
        .post("/classrooms/create")
        .json(&json!({
            "user_id": teacher_id,
            "title": "   ",
            "description": "Missing a title",
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = env
        .server
        .post("/classrooms/create")
        .json(&json!({
            "user_id": teacher_id,
            "title": "Web",
            "description": "Wrong attachment",
            "requirements_file": "brief.exe",
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_create_classroom_unknown_user() {
    let env = setup_test_environment().await;
    let payload = CreateClassroomPayload {
        user_id: 999_999,
        title: "Ghost".to_string(),
        description: "No such teacher".to_string(),
        requirements_file: None,
    };
    let response = env.server.post("/classrooms/create").json(&payload).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

// join

#[tokio::test]
async fn test_join_lowercase_then_rejoin_conflicts() {
    let env = setup_test_environment().await;
    let teacher_id = create_test_teacher(&env.pool, "prof").await;
    let student_id = create_test_student(&env.pool, "stud").await;
    let classroom_id = create_test_classroom(&env.pool, teacher_id, "Web Dev", "AB12CD34").await;

    let payload = JoinClassroomPayload {
        user_id: student_id,
        join_code: " ab12cd34 ".to_string(),
    };
    let response = env.server.post("/classrooms/join").json(&payload).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: ApiResponse<JoinClassroomResponse> = response.json();
    assert_eq!(body.status_message, "You have successfully joined Web Dev!");
    assert_eq!(body.data.unwrap().classroom_id, classroom_id);

    let response = env.server.post("/classrooms/join").json(&payload).await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    let body: ApiResponse<Value> = response.json();
    assert_eq!(
        body.status_message,
        "You are already a member of this classroom."
    );

    assert_eq!(count_memberships(&env.pool, classroom_id).await, 1);
}

#[tokio::test]
async fn test_join_malformed_and_unknown_codes() {
    let env = setup_test_environment().await;
    let teacher_id = create_test_teacher(&env.pool, "prof").await;
    let student_id = create_test_student(&env.pool, "stud").await;
    create_test_classroom(&env.pool, teacher_id, "Web Dev", "AB12CD34").await;

    let response = env
        .server
        .post("/classrooms/join")
        .json(&json!({ "user_id": student_id, "join_code": "AB12-D34" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = env
        .server
        .post("/classrooms/join")
        .json(&json!({ "user_id": student_id, "join_code": "ZZZZ9999" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_join_forbidden_for_teacher() {
    let env = setup_test_environment().await;
    let owner_id = create_test_teacher(&env.pool, "prof").await;
    let other_teacher = create_test_teacher(&env.pool, "prof2").await;
    let classroom_id = create_test_classroom(&env.pool, owner_id, "Web Dev", "AB12CD34").await;

    for user_id in [owner_id, other_teacher] {
        let response = env
            .server
            .post("/classrooms/join")
            .json(&json!({ "user_id": user_id, "join_code": "AB12CD34" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    }
    assert_eq!(count_memberships(&env.pool, classroom_id).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_duplicate_joins_admit_one() {
    let env = setup_test_environment().await;
    let teacher_id = create_test_teacher(&env.pool, "prof").await;
    let student_id = create_test_student(&env.pool, "stud").await;
    let classroom_id = create_test_classroom(&env.pool, teacher_id, "Web Dev", "AB12CD34").await;

    let payload = json!({ "user_id": student_id, "join_code": "AB12CD34" });
    let (first, second) = tokio::join!(
        env.server.post("/classrooms/join").json(&payload).into_future(),
        env.server.post("/classrooms/join").json(&payload).into_future(),
    );

    let mut statuses = vec![first.status_code(), second.status_code()];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CONFLICT]);
    assert_eq!(count_memberships(&env.pool, classroom_id).await, 1);
}

// list

#[tokio::test]
async fn test_list_classrooms_is_role_scoped() {
    let env = setup_test_environment().await;
    let teacher_id = create_test_teacher(&env.pool, "prof").await;
    let other_teacher = create_test_teacher(&env.pool, "prof2").await;
    let student_id = create_test_student(&env.pool, "stud").await;
    let joined = create_test_classroom(&env.pool, teacher_id, "Web Dev", "AAAA1111").await;
    let _not_joined = create_test_classroom(&env.pool, teacher_id, "Databases", "BBBB2222").await;
    let _foreign = create_test_classroom(&env.pool, other_teacher, "Networks", "CCCC3333").await;
    create_test_membership(&env.pool, joined, student_id).await;
    create_test_submission(
        &env.pool,
        joined,
        student_id,
        "Shop",
        SubmissionStatus::Submitted,
        &[],
    )
    .await;

    let response = env
        .server
        .get("/classrooms")
        .add_query_param("user_id", teacher_id)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let page: Page<ClassroomSummary> = response
        .json::<ApiResponse<Page<ClassroomSummary>>>()
        .data
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.per_page, 12);
    assert!(page.items.iter().all(|c| c.join_code.is_some()));
    let web = page.items.iter().find(|c| c.id == joined).unwrap();
    assert_eq!(web.student_count, 1);
    assert_eq!(web.submission_count, 1);

    let response = env
        .server
        .get("/classrooms")
        .add_query_param("user_id", student_id)
        .await;
    let page: Page<ClassroomSummary> = response
        .json::<ApiResponse<Page<ClassroomSummary>>>()
        .data
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, joined);
    assert_eq!(page.items[0].join_code, None);
    assert_eq!(page.items[0].teacher.id, teacher_id);
}

#[tokio::test]
async fn test_list_classrooms_search_and_pagination() {
    let env = setup_test_environment().await;
    let teacher_id = create_test_user(&env.pool, "prof", "Maria", "Fernandes", true).await;
    create_test_classroom(&env.pool, teacher_id, "Web Development", "AAAA1111").await;
    create_test_classroom(&env.pool, teacher_id, "Databases", "BBBB2222").await;
    create_test_classroom(&env.pool, teacher_id, "Advanced Web", "CCCC3333").await;

    let response = env
        .server
        .get("/classrooms")
        .add_query_param("user_id", teacher_id)
        .add_query_param("search", "WEB")
        .await;
    let page = response
        .json::<ApiResponse<Page<ClassroomSummary>>>()
        .data
        .unwrap();
    assert_eq!(page.total, 2);

    let response = env
        .server
        .get("/classrooms")
        .add_query_param("user_id", teacher_id)
        .add_query_param("search", "fernandes")
        .add_query_param("per_page", 2)
        .add_query_param("page", 2)
        .await;
    let page = response
        .json::<ApiResponse<Page<ClassroomSummary>>>()
        .data
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total_pages(), 2);
}

// detail

#[tokio::test]
async fn test_get_classroom_detail_for_owner_and_member() {
    let env = setup_test_environment().await;
    let teacher_id = create_test_teacher(&env.pool, "prof").await;
    let alice = create_test_user(&env.pool, "alice", "Alice", "Zephyr", false).await;
    let bob = create_test_user(&env.pool, "bob", "Bob", "Adams", false).await;
    let outsider = create_test_student(&env.pool, "outsider").await;
    let classroom_id = create_test_classroom(&env.pool, teacher_id, "Web Dev", "AB12CD34").await;
    create_test_membership(&env.pool, classroom_id, alice).await;
    create_test_membership(&env.pool, classroom_id, bob).await;
    let draft = create_test_submission(
        &env.pool,
        classroom_id,
        alice,
        "Draft",
        SubmissionStatus::Draft,
        &[],
    )
    .await;
    let submitted = create_test_submission(
        &env.pool,
        classroom_id,
        bob,
        "Submitted",
        SubmissionStatus::Submitted,
        &[],
    )
    .await;

    let response = env
        .server
        .get(&format!("/classrooms/{}", classroom_id))
        .add_query_param("user_id", teacher_id)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let detail = response
        .json::<ApiResponse<ClassroomDetailResponse>>()
        .data
        .unwrap();
    assert!(detail.is_owner);
    assert!(!detail.is_member);
    assert_eq!(detail.member_count, 2);
    assert_eq!(detail.members[0].student.id, bob);
    assert_eq!(detail.submissions.len(), 1);
    assert_eq!(detail.submissions[0].id, submitted);
    assert_eq!(detail.classroom.join_code.as_deref(), Some("AB12CD34"));

    let response = env
        .server
        .get(&format!("/classrooms/{}", classroom_id))
        .add_query_param("user_id", alice)
        .await;
    let detail = response
        .json::<ApiResponse<ClassroomDetailResponse>>()
        .data
        .unwrap();
    assert!(!detail.is_owner);
    assert!(detail.is_member);
    assert!(detail.submissions.is_empty());
    assert_eq!(detail.my_submission.map(|s| s.id), Some(draft));
    assert_eq!(detail.classroom.join_code, None);

    let response = env
        .server
        .get(&format!("/classrooms/{}", classroom_id))
        .add_query_param("user_id", outsider)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = env
        .server
        .get("/classrooms/999999")
        .add_query_param("user_id", teacher_id)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_member_detail_prefers_own_submission() {
    let env = setup_test_environment().await;
    let teacher_id = create_test_teacher(&env.pool, "prof").await;
    let alice = create_test_student(&env.pool, "alice").await;
    let bob = create_test_student(&env.pool, "bob").await;
    let classroom_id = create_test_classroom(&env.pool, teacher_id, "Web Dev", "AB12CD34").await;
    create_test_membership(&env.pool, classroom_id, alice).await;
    create_test_membership(&env.pool, classroom_id, bob).await;
    // bob's project lists alice as a collaborator and is older than hers
    let bobs = create_test_submission(
        &env.pool,
        classroom_id,
        bob,
        "Blog",
        SubmissionStatus::Draft,
        &[alice],
    )
    .await;
    let alices = create_test_submission(
        &env.pool,
        classroom_id,
        alice,
        "Shop",
        SubmissionStatus::Draft,
        &[],
    )
    .await;
    assert!(bobs < alices);

    for _ in 0..3 {
        let response = env
            .server
            .get(&format!("/classrooms/{}", classroom_id))
            .add_query_param("user_id", alice)
            .await;
        let detail = response
            .json::<ApiResponse<ClassroomDetailResponse>>()
            .data
            .unwrap();
        assert_eq!(detail.my_submission.map(|s| s.id), Some(alices));
    }

    let response = env
        .server
        .get(&format!("/classrooms/{}", classroom_id))
        .add_query_param("user_id", bob)
        .await;
    let detail = response
        .json::<ApiResponse<ClassroomDetailResponse>>()
        .data
        .unwrap();
    assert_eq!(detail.my_submission.map(|s| s.id), Some(bobs));
}

// update / delete / regenerate

#[tokio::test]
async fn test_update_classroom_owner_only() {
    let env = setup_test_environment().await;
    let owner = create_test_teacher(&env.pool, "prof").await;
    let other = create_test_teacher(&env.pool, "prof2").await;
    let classroom_id = create_test_classroom(&env.pool, owner, "Web Dev", "AB12CD34").await;

    let payload = UpdateClassroomPayload {
        user_id: other,
        title: Some("Hijacked".to_string()),
        description: None,
        requirements_file: None,
    };
    let response = env
        .server
        .post(&format!("/classrooms/{}/update", classroom_id))
        .json(&payload)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let payload = UpdateClassroomPayload {
        user_id: owner,
        title: Some("Web Development II".to_string()),
        description: None,
        requirements_file: Some("brief.docx".to_string()),
    };
    let response = env
        .server
        .post(&format!("/classrooms/{}/update", classroom_id))
        .json(&payload)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let summary = response
        .json::<ApiResponse<ClassroomSummary>>()
        .data
        .unwrap();
    assert_eq!(summary.title, "Web Development II");
    assert_eq!(summary.description, "Web Dev description");
    assert_eq!(summary.requirements_file.as_deref(), Some("brief.docx"));
}

#[tokio::test]
async fn test_regenerate_join_code_invalidates_old_code() {
    let env = setup_test_environment().await;
    let owner = create_test_teacher(&env.pool, "prof").await;
    let student_id = create_test_student(&env.pool, "stud").await;
    let classroom_id = create_test_classroom(&env.pool, owner, "Web Dev", "AB12CD34").await;

    let response = env
        .server
        .post(&format!("/classrooms/{}/regenerate_code", classroom_id))
        .json(&ClassroomActionPayload {
            user_id: student_id,
        })
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = env
        .server
        .post(&format!("/classrooms/{}/regenerate_code", classroom_id))
        .json(&ClassroomActionPayload { user_id: owner })
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let new_code = response
        .json::<ApiResponse<JoinCodeResponse>>()
        .data
        .unwrap()
        .join_code;
    assert!(join_code::is_well_formed(&new_code));
    assert_eq!(
        fetch_join_code(&env.pool, classroom_id).await,
        Some(new_code.clone())
    );

    if new_code != "AB12CD34" {
        let response = env
            .server
            .post("/classrooms/join")
            .json(&json!({ "user_id": student_id, "join_code": "AB12CD34" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    let response = env
        .server
        .post("/classrooms/join")
        .json(&json!({ "user_id": student_id, "join_code": new_code.to_lowercase() }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_delete_classroom_cascades() {
    let env = setup_test_environment().await;
    let owner = create_test_teacher(&env.pool, "prof").await;
    let student_id = create_test_student(&env.pool, "stud").await;
    let classroom_id = create_test_classroom(&env.pool, owner, "Web Dev", "AB12CD34").await;
    create_test_membership(&env.pool, classroom_id, student_id).await;
    let submission_id = create_test_submission(
        &env.pool,
        classroom_id,
        student_id,
        "Shop",
        SubmissionStatus::Draft,
        &[],
    )
    .await;

    let response = env
        .server
        .post(&format!("/classrooms/{}/delete", classroom_id))
        .json(&ClassroomActionPayload {
            user_id: student_id,
        })
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = env
        .server
        .post(&format!("/classrooms/{}/delete", classroom_id))
        .json(&ClassroomActionPayload { user_id: owner })
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    assert_eq!(fetch_join_code(&env.pool, classroom_id).await, None);
    assert_eq!(count_memberships(&env.pool, classroom_id).await, 0);
    assert!(fetch_submission(&env.pool, submission_id).await.is_none());
}

// membership

#[tokio::test]
async fn test_leave_classroom() {
    let env = setup_test_environment().await;
    let owner = create_test_teacher(&env.pool, "prof").await;
    let student_id = create_test_student(&env.pool, "stud").await;
    let classroom_id = create_test_classroom(&env.pool, owner, "Web Dev", "AB12CD34").await;
    create_test_membership(&env.pool, classroom_id, student_id).await;

    let path = format!("/classrooms/{}/leave", classroom_id);
    let payload = ClassroomActionPayload {
        user_id: student_id,
    };
    let response = env.server.post(&path).json(&payload).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(count_memberships(&env.pool, classroom_id).await, 0);

    let response = env.server.post(&path).json(&payload).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_members_ordered_by_name() {
    let env = setup_test_environment().await;
    let owner = create_test_teacher(&env.pool, "prof").await;
    let zed = create_test_user(&env.pool, "zed", "Zed", "Young", false).await;
    let ann = create_test_user(&env.pool, "ann", "Ann", "Brown", false).await;
    let abe = create_test_user(&env.pool, "abe", "Abe", "Brown", false).await;
    let outsider = create_test_student(&env.pool, "outsider").await;
    let classroom_id = create_test_classroom(&env.pool, owner, "Web Dev", "AB12CD34").await;
    for student in [zed, ann, abe] {
        create_test_membership(&env.pool, classroom_id, student).await;
    }

    let response = env
        .server
        .get(&format!("/classrooms/{}/members", classroom_id))
        .add_query_param("user_id", zed)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let page = response
        .json::<ApiResponse<Page<MemberResponse>>>()
        .data
        .unwrap();
    let order: Vec<i64> = page.items.iter().map(|m| m.student.id).collect();
    assert_eq!(order, vec![abe, ann, zed]);
    assert_eq!(page.items[0].student.display_name, "Abe Brown");
    assert_eq!(page.per_page, 20);

    let response = env
        .server
        .get(&format!("/classrooms/{}/members", classroom_id))
        .add_query_param("user_id", outsider)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_remove_member_keeps_submissions() {
    let env = setup_test_environment().await;
    let owner = create_test_teacher(&env.pool, "prof").await;
    let other_teacher = create_test_teacher(&env.pool, "prof2").await;
    let student_id = create_test_student(&env.pool, "stud").await;
    let classroom_id = create_test_classroom(&env.pool, owner, "Web Dev", "AB12CD34").await;
    create_test_membership(&env.pool, classroom_id, student_id).await;
    let submission_id = create_test_submission(
        &env.pool,
        classroom_id,
        student_id,
        "Shop",
        SubmissionStatus::Submitted,
        &[],
    )
    .await;

    let path = format!("/classrooms/{}/members/{}/remove", classroom_id, student_id);
    let response = env
        .server
        .post(&path)
        .json(&ClassroomActionPayload {
            user_id: other_teacher,
        })
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = env
        .server
        .post(&path)
        .json(&ClassroomActionPayload { user_id: owner })
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(count_memberships(&env.pool, classroom_id).await, 0);
    assert!(fetch_submission(&env.pool, submission_id).await.is_some());

    let response = env
        .server
        .post(&path)
        .json(&ClassroomActionPayload { user_id: owner })
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

// classroom submissions

#[tokio::test]
async fn test_classroom_submissions_with_stats() {
    let env = setup_test_environment().await;
    let owner = create_test_teacher(&env.pool, "prof").await;
    let s1 = create_test_student(&env.pool, "s1").await;
    let s2 = create_test_student(&env.pool, "s2").await;
    let s3 = create_test_student(&env.pool, "s3").await;
    let classroom_id = create_test_classroom(&env.pool, owner, "Web Dev", "AB12CD34").await;
    for student in [s1, s2, s3] {
        create_test_membership(&env.pool, classroom_id, student).await;
    }
    create_test_submission(&env.pool, classroom_id, s1, "Draft", SubmissionStatus::Draft, &[])
        .await;
    let pending = create_test_submission(
        &env.pool,
        classroom_id,
        s2,
        "Pending",
        SubmissionStatus::Submitted,
        &[],
    )
    .await;
    let graded = create_test_submission(
        &env.pool,
        classroom_id,
        s3,
        "Graded",
        SubmissionStatus::Submitted,
        &[],
    )
    .await;
    set_test_grade(&env.pool, graded, 17).await;

    let path = format!("/classrooms/{}/submissions", classroom_id);
    let response = env.server.get(&path).add_query_param("user_id", owner).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let listing = response
        .json::<ApiResponse<ClassroomSubmissionListResponse>>()
        .data
        .unwrap();
    assert_eq!(listing.classroom_title, "Web Dev");
    assert_eq!(listing.submissions.total, 2);
    assert_eq!(listing.stats.total, 2);
    assert_eq!(listing.stats.pending, 1);
    assert_eq!(listing.stats.graded, 1);

    let response = env
        .server
        .get(&path)
        .add_query_param("user_id", owner)
        .add_query_param("status", "GRADED")
        .await;
    let listing = response
        .json::<ApiResponse<ClassroomSubmissionListResponse>>()
        .data
        .unwrap();
    let ids: Vec<i64> = listing.submissions.items.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![graded]);

    let response = env
        .server
        .get(&path)
        .add_query_param("user_id", owner)
        .add_query_param("status", "SUBMITTED")
        .await;
    let listing = response
        .json::<ApiResponse<ClassroomSubmissionListResponse>>()
        .data
        .unwrap();
    let mut ids: Vec<i64> = listing.submissions.items.iter().map(|s| s.id).collect();
    ids.sort();
    assert_eq!(ids, vec![pending, graded]);

    let response = env
        .server
        .get(&path)
        .add_query_param("user_id", owner)
        .add_query_param("status", "DRAFT")
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = env.server.get(&path).add_query_param("user_id", s1).await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}
