//! SQL statement and query builders for the mining engine.
//!
//! All change numbers are interpolated as numeric literals and all names go
//! through the engine's PL/SQL entry points, matching what the server-side
//! packages expect.

use crate::config::{DictionaryTarget, MiningStrategy};
use crate::scn::MiningWindow;
use std::time::Duration;

const LOG_VIEW: &str = "V$LOG";
const LOGFILE_VIEW: &str = "V$LOGFILE";
const ARCHIVED_LOG_VIEW: &str = "V$ARCHIVED_LOG";
const ARCHIVE_DEST_STATUS_VIEW: &str = "V$ARCHIVE_DEST_STATUS";
const REGISTERED_LOGS_VIEW: &str = "V$LOGMNR_LOGS";
const CONTENTS_VIEW: &str = "V$LOGMNR_CONTENTS";
const DATABASE_VIEW: &str = "V$DATABASE";

/// Candidate segment query. Six columns per row:
/// `NAME, FIRST_CHANGE#, NEXT_CHANGE#, STATUS, TYPE, SEQUENCE#`.
///
/// Online rows carry no change-number condition; their inclusion filter runs
/// client-side where the current flag can be honored. Archived rows are
/// pre-filtered to the window on the server.
pub(crate) fn minable_segments_query(
    window: MiningWindow,
    retention: Duration,
    archive_only: bool,
    destination: Option<&str>,
) -> String {
    let mut sql = String::with_capacity(1024);

    if !archive_only {
        sql.push_str(&format!(
            "SELECT MIN(F.MEMBER) AS NAME, TO_CHAR(L.FIRST_CHANGE#) AS FIRST_CHANGE, \
             TO_CHAR(L.NEXT_CHANGE#) AS NEXT_CHANGE, L.STATUS, 'ONLINE' AS TYPE, \
             L.SEQUENCE# AS SEQ \
             FROM {logfile} F, {log} L \
             LEFT JOIN {archived} A \
             ON A.FIRST_CHANGE# = L.FIRST_CHANGE# AND A.NEXT_CHANGE# = L.NEXT_CHANGE# \
             WHERE A.FIRST_CHANGE# IS NULL \
             AND F.GROUP# = L.GROUP# \
             GROUP BY F.GROUP#, L.FIRST_CHANGE#, L.NEXT_CHANGE#, L.STATUS, L.SEQUENCE# \
             UNION ",
            logfile = LOGFILE_VIEW,
            log = LOG_VIEW,
            archived = ARCHIVED_LOG_VIEW,
        ));
    }

    sql.push_str(&format!(
        "SELECT A.NAME AS NAME, TO_CHAR(A.FIRST_CHANGE#) AS FIRST_CHANGE, \
         TO_CHAR(A.NEXT_CHANGE#) AS NEXT_CHANGE, NULL AS STATUS, 'ARCHIVED' AS TYPE, \
         A.SEQUENCE# AS SEQ \
         FROM {archived} A \
         WHERE A.NAME IS NOT NULL \
         AND A.ARCHIVED = 'YES' \
         AND A.STATUS = 'A' \
         AND A.NEXT_CHANGE# > {offset} \
         AND A.FIRST_CHANGE# <= {end} \
         AND A.DEST_ID IN ({dest}) ",
        archived = ARCHIVED_LOG_VIEW,
        offset = window.offset_scn,
        end = window.end_scn,
        dest = local_destination_subquery(destination),
    ));

    let retention_hours = retention.as_secs() / 3600;
    if retention_hours > 0 {
        sql.push_str(&format!(
            "AND A.FIRST_TIME >= SYSDATE - ({retention_hours}/24) "
        ));
    }

    sql.push_str("ORDER BY 6");
    sql
}

/// Archive destination filter: the named destination, or the first locally
/// valid one when unspecified.
fn local_destination_subquery(destination: Option<&str>) -> String {
    let mut query = format!(
        "SELECT DEST_ID FROM {ARCHIVE_DEST_STATUS_VIEW} WHERE STATUS='VALID' AND TYPE='LOCAL' "
    );
    match destination {
        Some(name) => {
            query.push_str(&format!("AND UPPER(DEST_NAME)='{}'", name.to_uppercase()));
        }
        None => query.push_str("AND ROWNUM=1"),
    }
    query
}

/// File names currently registered with the mining engine, one per row.
pub(crate) fn registered_segments_query() -> String {
    format!("SELECT FILENAME AS NAME FROM {REGISTERED_LOGS_VIEW}")
}

pub(crate) fn remove_segment_statement(name: &str) -> String {
    format!("BEGIN SYS.DBMS_LOGMNR.REMOVE_LOGFILE(LOGFILENAME => '{name}'); END;")
}

pub(crate) fn add_segment_statement(name: &str) -> String {
    format!(
        "BEGIN SYS.DBMS_LOGMNR.ADD_LOGFILE(LOGFILENAME => '{name}', \
         OPTIONS => DBMS_LOGMNR.ADDFILE); END;"
    )
}

pub(crate) fn build_dictionary_statement(target: &DictionaryTarget) -> String {
    match target {
        DictionaryTarget::RedoLogs => {
            "BEGIN DBMS_LOGMNR_D.BUILD (OPTIONS => DBMS_LOGMNR_D.STORE_IN_REDO_LOGS); END;"
                .to_string()
        }
        DictionaryTarget::FlatFile { directory, file_name } => format!(
            "BEGIN DBMS_LOGMNR_D.BUILD (DICTIONARY_FILENAME => '{file_name}', \
             DICTIONARY_LOCATION => '{directory}', \
             OPTIONS => DBMS_LOGMNR_D.STORE_IN_FLAT_FILE); END;"
        ),
    }
}

pub(crate) fn start_mining_statement(
    window: MiningWindow,
    strategy: MiningStrategy,
    continuous_mining: bool,
) -> String {
    let mut options = match strategy {
        MiningStrategy::RedoLogDictionary => {
            "DBMS_LOGMNR.DICT_FROM_REDO_LOGS + DBMS_LOGMNR.DDL_DICT_TRACKING".to_string()
        }
        MiningStrategy::OnlineCatalog => "DBMS_LOGMNR.DICT_FROM_ONLINE_CATALOG".to_string(),
    };
    if continuous_mining {
        options.push_str(" + DBMS_LOGMNR.CONTINUOUS_MINE");
    }
    options.push_str(" + DBMS_LOGMNR.NO_ROWID_IN_STMT");

    format!(
        "BEGIN SYS.DBMS_LOGMNR.START_LOGMNR(\
         STARTSCN => '{start}', \
         ENDSCN => '{end}', \
         OPTIONS => {options}); END;",
        start = window.offset_scn,
        end = window.end_scn,
    )
}

pub(crate) fn end_mining_statement() -> &'static str {
    "BEGIN SYS.DBMS_LOGMNR.END_LOGMNR(); END;"
}

/// Reconstructed change records for the window. Seven columns per row:
/// `SCN, OPERATION_CODE, XID, SEG_OWNER, TABLE_NAME, SQL_REDO, CSF`.
pub(crate) fn mining_contents_query(window: MiningWindow) -> String {
    format!(
        "SELECT TO_CHAR(SCN), OPERATION_CODE, RAWTOHEX(XID) AS XID, SEG_OWNER, TABLE_NAME, \
         SQL_REDO, CSF \
         FROM {CONTENTS_VIEW} \
         WHERE SCN > {offset} AND SCN <= {end}",
        offset = window.offset_scn,
        end = window.end_scn,
    )
}

/// Total bytes of the named segments, one `SUM` row.
pub(crate) fn segment_bytes_query(names: &[String]) -> String {
    format!(
        "SELECT SUM(BLOCKS * BLOCK_SIZE) FROM {ARCHIVED_LOG_VIEW} WHERE NAME IN ('{}')",
        names.join("','")
    )
}

/// Oldest/newest mineable change numbers, one row:
/// `MIN_SCN, LAST_ARCHIVED_SCN, MAX_SCN`.
pub(crate) fn scn_inventory_query() -> String {
    format!(
        "SELECT \
         (SELECT TO_CHAR(MIN(FIRST_CHANGE#)) FROM {ARCHIVED_LOG_VIEW} \
          WHERE NAME IS NOT NULL AND STATUS = 'A'), \
         (SELECT TO_CHAR(MAX(FIRST_CHANGE#)) FROM {ARCHIVED_LOG_VIEW} \
          WHERE NAME IS NOT NULL AND STATUS = 'A'), \
         (SELECT TO_CHAR(MAX(NEXT_CHANGE#)) FROM {LOG_VIEW}) \
         FROM DUAL"
    )
}

pub(crate) fn current_scn_query() -> String {
    format!("SELECT TO_CHAR(CURRENT_SCN) FROM {DATABASE_VIEW}")
}
