use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use user_registration_core::contract::USERS_TABLE_ENV_VAR;
use user_registration_core::record::{FieldValue, UserItem};
use user_registration_lambda::adapters::user_store::UserStore;
use user_registration_lambda::handlers::register::{handle_register_event, ApiGatewayResponse};

struct DynamoDbUserStore {
    dynamodb_client: aws_sdk_dynamodb::Client,
}

impl UserStore for DynamoDbUserStore {
    fn put_user(&self, table_name: &str, item: &UserItem) -> Result<(), String> {
        let table = table_name.to_string();
        let attributes = to_attribute_values(item);
        let client = self.dynamodb_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_item()
                    .table_name(table)
                    .set_item(Some(attributes))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| format!("failed to put item to dynamodb: {error}"))
            })
        })
    }
}

fn to_attribute_values(item: &UserItem) -> HashMap<String, AttributeValue> {
    item.iter()
        .map(|(field, value)| {
            let attribute = match value {
                FieldValue::Text(text) => AttributeValue::S(text.clone()),
                FieldValue::Number(number) => AttributeValue::N(number.to_string()),
            };
            (field.clone(), attribute)
        })
        .collect()
}

async fn handle_request(
    event: LambdaEvent<Value>,
    store: &DynamoDbUserStore,
) -> Result<ApiGatewayResponse, Error> {
    // Read per invocation so a missing table name surfaces as a 500 response
    // on the request path rather than a startup failure.
    let table_name = std::env::var(USERS_TABLE_ENV_VAR).ok();
    Ok(handle_register_event(
        event.payload,
        table_name.as_deref(),
        store,
    ))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = DynamoDbUserStore {
        dynamodb_client: aws_sdk_dynamodb::Client::new(&aws_config),
    };
    let store_ref = &store;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(event, store_ref).await
    }))
    .await
}
