// 旅程アプリケーションのコレクションカタログ
//
// BLCK BX が使用するすべてのコレクション定義を宣言順に保持します。
// 親コレクション（projects, destinations）は参照する側より先に宣言されます。

use crate::core::collection::{Collection, Field};
use crate::core::migration::MigrationStep;

/// カタログを登録するマイグレーションのバージョン
pub const INIT_MIGRATION_VERSION: &str = "1727702400";

/// カタログを登録するマイグレーションの名前
pub const INIT_MIGRATION_NAME: &str = "init_collections";

/// カバー画像の最大サイズ（5MiB）
pub const COVER_IMAGE_MAX_SIZE: u64 = 5_242_880;

const TRANSFER_TYPES: &[&str] = &["none", "taxi", "train"];
const SOURCE_TYPES: &[&str] = &["manual", "autofill", "ai_suggested"];

/// コレクションカタログ
///
/// 宣言順のコレクション定義リストと、それを登録するマイグレーションの識別情報を持ちます。
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    /// マイグレーションのバージョン
    pub version: String,
    /// マイグレーションの名前
    pub name: String,
    /// コレクション定義（宣言順）
    pub collections: Vec<Collection>,
}

impl Catalog {
    /// 新しいカタログを作成
    pub fn new(version: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            name: name.into(),
            collections: Vec::new(),
        }
    }

    /// コレクションを追加（ビルダー形式）
    pub fn with_collection(mut self, collection: Collection) -> Self {
        self.collections.push(collection);
        self
    }

    /// コレクションを追加
    pub fn add_collection(&mut self, collection: Collection) {
        self.collections.push(collection);
    }

    /// 宣言順のコレクション一覧
    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    /// 名前でコレクションを取得
    pub fn get(&self, name: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// 指定されたコレクションが存在するか確認
    pub fn has_collection(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// コレクション名の一覧（宣言順）
    pub fn collection_names(&self) -> Vec<&str> {
        self.collections.iter().map(|c| c.name.as_str()).collect()
    }

    /// 宣言順での位置
    pub fn position(&self, name: &str) -> Option<usize> {
        self.collections.iter().position(|c| c.name == name)
    }

    /// コレクション数
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// このカタログを登録するマイグレーションステップ
    pub fn migration_step(&self, checksum: String) -> MigrationStep {
        MigrationStep::new(self.version.clone(), self.name.clone(), checksum)
    }
}

/// 旅程アプリケーションの固定カタログを構築
pub fn itinerary_catalog() -> Catalog {
    Catalog::new(INIT_MIGRATION_VERSION, INIT_MIGRATION_NAME)
        .with_collection(projects())
        .with_collection(destinations())
        .with_collection(travellers())
        .with_collection(outbound_travel())
        .with_collection(accommodations())
        .with_collection(activities())
        .with_collection(dining())
        .with_collection(bars())
        .with_collection(inter_destination_travel())
        .with_collection(return_travel())
        .with_collection(helpful_information())
}

fn projects() -> Collection {
    Collection::base("projects").with_fields([
        Field::relation("user_field", "user", "users").required(),
        Field::text("name").required(),
        Field::text("customUrlSlug").unique(),
        Field::select("projectType", &["itinerary", "list"]).with_default("itinerary"),
        Field::select("status", &["draft", "published"]).with_default("draft"),
        Field::bool("isTemplate").with_default(false),
        Field::text("templateName"),
        Field::text("templateDescription"),
        Field::text("assistantName").required(),
        Field::email("assistantEmail").required(),
        Field::bool("outboundTravelVisible").with_default(true),
        Field::bool("returnTravelVisible").with_default(true),
        Field::bool("helpfulInfoVisible").with_default(true),
        Field::file("coverImage", 1, COVER_IMAGE_MAX_SIZE),
    ])
}

fn destinations() -> Collection {
    Collection::base("destinations").with_fields([
        project_field(),
        Field::text("name").required(),
        Field::text("dates"),
        Field::text("location"),
        Field::text("weather"),
        Field::url("weatherUrl"),
        display_order(),
    ])
}

fn travellers() -> Collection {
    Collection::base("travellers").with_fields([
        project_field(),
        Field::text("name").required(),
        Field::select("type", &["adult", "child"])
            .required()
            .with_default("adult"),
        Field::number("ageAtTravel"),
        display_order(),
    ])
}

fn outbound_travel() -> Collection {
    Collection::base("outbound_travel")
        .with_field(project_field().unique())
        .with_fields(transfer_block("transferToAirport"))
        .with_fields(flight_block())
        .with_fields(transfer_block("transferToAccom"))
}

fn accommodations() -> Collection {
    venue(
        "accommodations",
        [
            Field::text("address"),
            Field::url("googleMapsLink"),
            Field::text("checkInDetails"),
            Field::text("bookingReference"),
            Field::url("websiteUrl"),
            Field::text("contactInfo"),
        ],
    )
}

fn activities() -> Collection {
    venue(
        "activities",
        [
            Field::text("description"),
            Field::text("price"),
            Field::text("contactDetails"),
            Field::text("address"),
            Field::url("googleMapsLink"),
            Field::url("websiteUrl"),
        ],
    )
}

fn dining() -> Collection {
    venue(
        "dining",
        [
            Field::text("cuisineType"),
            Field::text("priceRange"),
            Field::text("contactDetails"),
            Field::text("address"),
            Field::url("googleMapsLink"),
            Field::url("websiteUrl"),
        ],
    )
}

fn bars() -> Collection {
    venue(
        "bars",
        [
            Field::text("barType"),
            Field::text("priceRange"),
            Field::text("contactDetails"),
            Field::text("address"),
            Field::url("googleMapsLink"),
            Field::url("websiteUrl"),
        ],
    )
}

fn inter_destination_travel() -> Collection {
    let texts = [
        // car
        "vehicleDetails",
        "vehicleRegistration",
        "carContactDetails",
        "carBookingDetails",
        // flight
        "flightNumber",
        "flightDate",
        "flightDepartureAirport",
        "flightArrivalAirport",
        "flightDepartureTime",
        "flightArrivalTime",
        "flightPassengersSeats",
        "flightThingsToRemember",
    ];
    let ferry_and_train = ["ferry", "train"].into_iter().flat_map(|mode| {
        [
            "DepartingFrom",
            "Destination",
            "Date",
            "Price",
            "ContactDetails",
            "AdditionalNotes",
            "BookingReference",
        ]
        .into_iter()
        .map(move |suffix| Field::text(&format!("{}{}", mode, suffix)))
    });

    Collection::base("inter_destination_travel")
        .with_field(project_field())
        .with_field(Field::select("travelType", &["car", "flight", "ferry", "train"]).required())
        .with_fields(texts.into_iter().map(Field::text))
        .with_field(Field::bool("flightIsMultiLeg").with_default(false))
        .with_field(Field::json("flightLegs"))
        .with_fields(ferry_and_train)
        .with_field(display_order())
        .with_field(Field::bool("visible").with_default(true))
}

fn return_travel() -> Collection {
    Collection::base("return_travel")
        .with_field(project_field().unique())
        .with_fields(transfer_block("transferToAirport"))
        .with_fields(flight_block())
        .with_fields(transfer_block("transferHome"))
}

fn helpful_information() -> Collection {
    Collection::base("helpful_information")
        .with_field(project_field().unique())
        .with_fields(
            [
                "localEmergency",
                "nearestEmbassy",
                "travelInsurance",
                "airlineCustomerService",
                "localMedicalClinic",
                "transportContacts",
            ]
            .into_iter()
            .map(Field::text),
        )
}

/// projects への必須参照
fn project_field() -> Field {
    Field::relation("project_field", "project", "projects").required()
}

fn display_order() -> Field {
    Field::number("displayOrder").with_default(0)
}

/// 送迎ブロック（タクシー / 電車）
fn transfer_block(prefix: &str) -> Vec<Field> {
    let mut fields = vec![Field::select(&format!("{}Type", prefix), TRANSFER_TYPES).with_default("none")];
    fields.extend(
        [
            "Company",
            "Contact",
            "CollectionTime",
            "PickupLocation",
            "PaymentStatus",
        ]
        .iter()
        .map(|suffix| Field::text(&format!("{}{}", prefix, suffix))),
    );
    fields.push(Field::json(&format!("{}Taxis", prefix)));
    fields.push(Field::json(&format!("{}Trains", prefix)));
    fields
}

/// フライトブロック
fn flight_block() -> Vec<Field> {
    let mut fields: Vec<Field> = [
        "flightNumber",
        "flightDate",
        "departureAirport",
        "arrivalAirport",
        "departureTime",
        "arrivalTime",
        "passengersSeats",
        "thingsToRemember",
    ]
    .into_iter()
    .map(Field::text)
    .collect();
    fields.push(Field::bool("isMultiLeg").with_default(false));
    fields.push(Field::json("legs"));
    fields
}

/// 目的地に紐づく施設系コレクション（宿泊・アクティビティ・飲食・バー）
///
/// 共通の前後フィールドの間に固有フィールドを挟みます。
fn venue(name: &str, specific: impl IntoIterator<Item = Field>) -> Collection {
    Collection::base(name)
        .with_field(project_field())
        .with_field(Field::relation("destination", "destination", "destinations"))
        .with_field(Field::text("name").required())
        .with_fields(specific)
        .with_fields([
            Field::json("images"),
            Field::text("notes"),
            display_order(),
            Field::bool("visible").with_default(true),
            Field::url("sourceUrl"),
            Field::select("sourceType", SOURCE_TYPES).with_default("manual"),
        ])
}
