//! Integration tests for the chart endpoints.

mod common;

use axum::http::StatusCode;
use common::{approx, TestClient, FOOD, HOUSING, SALARY, TRANSPORT};
use serde_json::Value;

#[tokio::test]
async fn test_monthly_overview_of_empty_year_is_zero_filled() {
    let client = TestClient::new();
    let (status, points) = client
        .get_json::<Vec<Value>>("/api/charts/monthly-overview?year=2024")
        .await;
    assert_eq!(status, StatusCode::OK);

    let points = points.unwrap();
    assert_eq!(points.len(), 12);
    assert_eq!(points[0]["month"], "Jan");
    assert_eq!(points[11]["month"], "Dec");
    assert!(points
        .iter()
        .all(|p| approx(&p["spent"], 0.0) && approx(&p["earned"], 0.0)));
}

#[tokio::test]
async fn test_cash_flow() {
    let client = TestClient::new();
    client.add_income(SALARY, "Paycheck", 3000.0, "2024-01-15").await;
    client.add_expense(FOOD, "Groceries", 250.5, "2024-01-20").await;
    client.add_expense(TRANSPORT, "Train", 40.0, "2024-03-02").await;
    client.add_expense(FOOD, "Last year", 99.0, "2023-01-20").await;

    let (status, points) = client
        .get_json::<Vec<Value>>("/api/charts/cash-flow?year=2024")
        .await;
    assert_eq!(status, StatusCode::OK);
    let points = points.unwrap();

    assert_eq!(points.len(), 12);
    assert_eq!(points[0]["month"], "Jan");
    assert!(approx(&points[0]["inflow"], 3000.0));
    assert!(approx(&points[0]["outflow"], 250.5));
    assert!(approx(&points[0]["netFlow"], 2749.5));
    assert!(approx(&points[2]["netFlow"], -40.0));
    assert!(approx(&points[5]["netFlow"], 0.0));
}

#[tokio::test]
async fn test_monthly_overview_pairs_spent_and_earned() {
    let client = TestClient::new();
    client.add_income(SALARY, "Paycheck", 2000.0, "2024-06-01").await;
    client.add_expense(HOUSING, "Rent", 1200.0, "2024-06-01").await;

    let (_, points) = client
        .get_json::<Vec<Value>>("/api/charts/monthly-overview?year=2024")
        .await;
    let june = &points.unwrap()[5];
    assert_eq!(june["month"], "Jun");
    assert!(approx(&june["spent"], 1200.0));
    assert!(approx(&june["earned"], 2000.0));
}

#[tokio::test]
async fn test_burndown_for_all_categories() {
    let client = TestClient::new();
    client.add_expense(FOOD, "Lunch", 20.0, "2024-02-03").await;
    client.add_expense(TRANSPORT, "Bus", 5.0, "2024-02-03").await;

    let (status, points) = client
        .get_json::<Vec<Value>>("/api/charts/burndown?month=2&year=2024")
        .await;
    assert_eq!(status, StatusCode::OK);
    let points = points.unwrap();

    // Leap year February.
    assert_eq!(points.len(), 29);
    assert_eq!(points[0]["day"], 1);
    assert_eq!(points[28]["day"], 29);
    assert!(approx(&points[2]["spent"], 25.0));
    // Seeded budgets: Food 400, Transport 100, Housing 1200.
    assert!(approx(&points[0]["remaining"], 1700.0));
    assert!(approx(&points[28]["remaining"], 1675.0));
}

#[tokio::test]
async fn test_burndown_for_single_category() {
    let client = TestClient::new();
    client.add_expense(FOOD, "Lunch", 20.0, "2024-02-03").await;
    client.add_expense(TRANSPORT, "Bus", 5.0, "2024-02-03").await;

    let (_, points) = client
        .get_json::<Vec<Value>>("/api/charts/burndown?month=2&year=2024&categoryId=1")
        .await;
    let points = points.unwrap();

    assert!(approx(&points[1]["remaining"], 400.0));
    assert!(approx(&points[2]["remaining"], 380.0));
    assert!(approx(&points[2]["spent"], 20.0));
}

#[tokio::test]
async fn test_burndown_rejects_unbudgeted_category_and_bad_month() {
    let client = TestClient::new();

    let (status, _) = client
        .get("/api/charts/burndown?month=2&year=2024&categoryId=4")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = client.get("/api/charts/burndown?month=13&year=2024").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid period"));
}

#[tokio::test]
async fn test_budget_burndown_maps() {
    let client = TestClient::new();
    client.add_expense(FOOD, "Lunch", 20.0, "2024-04-10").await;

    let (status, burndown) = client
        .get_json::<Value>("/budget/burndown?month=4&year=2024")
        .await;
    assert_eq!(status, StatusCode::OK);
    let burndown = burndown.unwrap();

    assert_eq!(burndown["month"], 4);
    assert_eq!(burndown["year"], 2024);
    let categories = burndown["categories"].as_array().unwrap();
    // "All Categories" followed by the three budgeted seed categories.
    assert_eq!(categories.len(), 4);
    assert_eq!(categories[0]["categoryId"], -1);
    assert_eq!(categories[0]["categoryName"], "All Categories");
    assert_eq!(categories[1]["categoryName"], "Food");

    let food = &categories[1];
    assert_eq!(food["dailySpending"].as_object().unwrap().len(), 30);
    assert_eq!(food["remainingBudget"].as_object().unwrap().len(), 30);
    assert!(approx(&food["dailySpending"]["10"], 20.0));
    assert!(approx(&food["remainingBudget"]["9"], 400.0));
    assert!(approx(&food["remainingBudget"]["10"], 380.0));
    assert!(approx(&food["totalSpent"], 20.0));
}

#[tokio::test]
async fn test_comparison_between_months() {
    let client = TestClient::new();
    client.add_expense(FOOD, "Feb food", 100.0, "2024-02-10").await;
    client.add_expense(HOUSING, "Feb rent", 900.0, "2024-02-01").await;
    client.add_expense(FOOD, "Mar food", 150.0, "2024-03-10").await;
    client.add_expense(TRANSPORT, "Mar bus", 30.0, "2024-03-11").await;

    let (status, response) = client
        .get_json::<Value>(
            "/api/charts/comparison?currentPeriodType=month&currentPeriodValue=3&currentYear=2024\
             &previousPeriodType=month&previousPeriodValue=2&previousYear=2024",
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let response = response.unwrap();

    assert_eq!(response["currentPeriodLabel"], "March 2024");
    assert_eq!(response["previousPeriodLabel"], "February 2024");

    let rows = response["categories"].as_array().unwrap();
    let names: Vec<&str> = rows
        .iter()
        .map(|r| r["categoryName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Food", "Transport", "Housing"]);

    let row = |name: &str| rows.iter().find(|r| r["categoryName"] == name).unwrap();
    assert!(approx(&row("Food")["percentageChange"], 50.0));
    assert!(approx(&row("Food")["difference"], 50.0));
    assert!(row("Transport")["percentageChange"].is_null());
    assert!(approx(&row("Housing")["percentageChange"], -100.0));

    assert!(approx(&response["totalCurrentPeriod"], 180.0));
    assert!(approx(&response["totalPreviousPeriod"], 1000.0));
    assert!(approx(&response["totalDifference"], -820.0));
    assert!(approx(&response["totalPercentageChange"], -82.0));
}

#[tokio::test]
async fn test_comparison_skips_categories_without_spending() {
    let client = TestClient::new();
    client.add_expense(FOOD, "Groceries", 42.0, "2024-03-08").await;

    let (status, response) = client
        .get_json::<Value>(
            "/api/charts/comparison?currentPeriodType=month&currentPeriodValue=3&currentYear=2024\
             &previousPeriodType=month&previousPeriodValue=2&previousYear=2024",
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let response = response.unwrap();

    let rows = response["categories"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["categoryName"], "Food");
    assert!(rows[0]["percentageChange"].is_null());
    assert!(response["totalPercentageChange"].is_null());

    let (_, empty) = client
        .get_json::<Value>(
            "/api/charts/comparison?currentPeriodType=month&currentPeriodValue=7&currentYear=2024\
             &previousPeriodType=month&previousPeriodValue=6&previousYear=2024",
        )
        .await;
    let empty = empty.unwrap();
    assert!(empty["categories"].as_array().unwrap().is_empty());
    assert!(approx(&empty["totalPercentageChange"], 0.0));
}

#[tokio::test]
async fn test_comparison_between_years() {
    let client = TestClient::new();
    client.add_expense(FOOD, "Old", 10.0, "2023-05-10").await;
    client.add_expense(FOOD, "New", 30.0, "2024-05-10").await;

    let (status, response) = client
        .get_json::<Value>(
            "/api/charts/comparison?currentPeriodType=year&currentPeriodValue=2024\
             &previousPeriodType=year&previousPeriodValue=2023",
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let response = response.unwrap();
    assert_eq!(response["currentPeriodLabel"], "2024");
    assert!(approx(&response["totalPercentageChange"], 200.0));
}

#[tokio::test]
async fn test_comparison_requires_year_for_months() {
    let client = TestClient::new();
    let (status, body) = client
        .get(
            "/api/charts/comparison?currentPeriodType=month&currentPeriodValue=3\
             &previousPeriodType=month&previousPeriodValue=2&previousYear=2024",
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("year is required"));

    let (status, _) = client
        .get(
            "/api/charts/comparison?currentPeriodType=week&currentPeriodValue=3\
             &previousPeriodType=year&previousPeriodValue=2023",
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_timeline_spans_year_boundary() {
    let client = TestClient::new();
    client.add_expense(FOOD, "January", 40.0, "2024-01-05").await;
    client.add_expense(TRANSPORT, "December", 10.0, "2023-12-24").await;

    let (status, points) = client
        .get_json::<Vec<Value>>(
            "/api/charts/timeline?endMonth=2&endYear=2024&months=3&categoryIds=1,2",
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let points = points.unwrap();

    let months: Vec<&str> = points.iter().map(|p| p["month"].as_str().unwrap()).collect();
    assert_eq!(months, vec!["Dec 2023", "Jan 2024", "Feb 2024"]);
    assert!(approx(&points[0]["cat_2"], 10.0));
    assert!(approx(&points[0]["cat_1"], 0.0));
    assert!(approx(&points[1]["cat_1"], 40.0));
    assert!(approx(&points[2]["cat_1"], 0.0));
}

#[tokio::test]
async fn test_timeline_defaults_and_validation() {
    let client = TestClient::new();

    let (_, points) = client
        .get_json::<Vec<Value>>("/api/charts/timeline?endMonth=6&endYear=2024")
        .await;
    let points = points.unwrap();
    assert_eq!(points.len(), 6);
    assert_eq!(points[0]["month"], "Jan 2024");
    assert_eq!(points[0].as_object().unwrap().len(), 1);

    let (status, _) = client
        .get("/api/charts/timeline?endMonth=6&endYear=2024&months=0")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = client
        .get("/api/charts/timeline?endMonth=6&endYear=2024&categoryIds=food")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sankey_month_view_has_expense_leaves() {
    let client = TestClient::new();
    client.add_expense(FOOD, "Lunch", 30.0, "2024-03-01").await;
    client.add_expense(TRANSPORT, "Bus", 20.0, "2024-03-02").await;
    client.add_expense(FOOD, "Dinner", 50.0, "2024-03-03").await;

    let (status, graph) = client
        .get_json::<Value>("/api/charts/sankey?month=3&year=2024&view=month")
        .await;
    assert_eq!(status, StatusCode::OK);
    let graph = graph.unwrap();

    let nodes = graph["nodes"].as_array().unwrap();
    let links = graph["links"].as_array().unwrap();
    let names: Vec<&str> = nodes.iter().map(|n| n["name"].as_str().unwrap()).collect();
    assert_eq!(
        names,
        vec!["Total Spent", "Food", "Transport", "Lunch", "Bus", "Dinner"]
    );
    assert!(approx(&nodes[0]["value"], 100.0));
    assert_eq!(links.len(), 5);

    let dinner_link = links.iter().find(|l| l["target"] == 5).unwrap();
    assert_eq!(dinner_link["source"], 1);
    assert!(links
        .iter()
        .all(|l| (l["target"].as_u64().unwrap() as usize) < nodes.len()));
}

#[tokio::test]
async fn test_sankey_year_view_stops_at_categories() {
    let client = TestClient::new();
    client.add_expense(FOOD, "Lunch", 30.0, "2024-03-01").await;
    client.add_expense(HOUSING, "Rent", 800.0, "2024-07-01").await;

    let (status, graph) = client
        .get_json::<Value>("/api/charts/sankey?year=2024&view=year")
        .await;
    assert_eq!(status, StatusCode::OK);
    let graph = graph.unwrap();

    assert_eq!(graph["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(graph["links"].as_array().unwrap().len(), 2);
    assert!(approx(&graph["nodes"][0]["value"], 830.0));
}

#[tokio::test]
async fn test_sankey_month_view_requires_month() {
    let client = TestClient::new();
    let (status, _) = client.get("/api/charts/sankey?year=2024").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sankey_of_empty_month_is_root_only() {
    let client = TestClient::new();
    let (_, graph) = client
        .get_json::<Value>("/api/charts/sankey?month=1&year=2024")
        .await;
    let graph = graph.unwrap();
    assert_eq!(graph["nodes"].as_array().unwrap().len(), 1);
    assert!(graph["links"].as_array().unwrap().is_empty());
}
